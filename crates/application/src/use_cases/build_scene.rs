//! Build scene use case

use std::collections::HashMap;
use std::sync::Arc;

use cascade_domain::{DependencyTracker, DomainError, NodeDefinition, NodeId, SceneDefinition, StatePaths};

use crate::error::ApplicationError;
use crate::ports::OptionsSource;
use crate::scene::Scene;

/// Errors that can occur when building a scene.
#[derive(Debug, thiserror::Error)]
pub enum BuildSceneError {
    /// The definition failed validation.
    #[error("Invalid scene definition: {0}")]
    Invalid(#[from] DomainError),

    /// The tree could not be assembled.
    #[error("Failed to assemble scene: {0}")]
    Assembly(#[from] ApplicationError),
}

/// Turns a scene definition into an inactive [`Scene`].
///
/// Nodes are created inactive; activation is left to the caller so that it
/// happens inside a runtime.
pub struct BuildScene {
    sources: HashMap<String, Arc<dyn OptionsSource>>,
}

impl BuildScene {
    /// Creates a new `BuildScene` use case without sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Registers an options source on every built scene.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, source: Arc<dyn OptionsSource>) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    /// Executes the use case.
    ///
    /// # Errors
    /// Returns an error if the definition is invalid.
    pub fn execute(&self, definition: SceneDefinition) -> Result<Scene, BuildSceneError> {
        definition.validate()?;

        let mut scene = Scene::new(definition.title);
        for (name, source) in &self.sources {
            scene.register_source(name.clone(), Arc::clone(source));
        }

        let root = scene.root();
        Self::build_node(&mut scene, root, definition.root)?;
        Ok(scene)
    }

    fn build_node(scene: &mut Scene, id: NodeId, node: NodeDefinition) -> Result<(), BuildSceneError> {
        scene.set_auto_activate(id, node.active)?;

        if !node.state.is_empty() || node.state_paths.is_some() {
            let paths = node.state_paths.map_or(StatePaths::All, StatePaths::Fields);
            scene.set_node_state(id, node.state)?;
            scene.track(id, DependencyTracker::new(paths))?;
        }

        if let Some(range) = node.time_range {
            scene.set_time_range(id, range)?;
        }

        if !node.variables.is_empty() {
            let variables = node
                .variables
                .into_iter()
                .map(cascade_domain::VariableDefinition::into_variable)
                .collect();
            scene.attach_scope(id, variables)?;
        }

        for child in node.children {
            let child_id = scene.add_node(id, child.title.clone())?;
            Self::build_node(scene, child_id, child)?;
        }
        Ok(())
    }
}

impl Default for BuildScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use cascade_domain::VariableValue;

    fn definition() -> SceneDefinition {
        serde_json::from_str(
            r#"{
                "title": "ops",
                "root": {
                    "title": "dashboard",
                    "variables": [{"name": "env", "type": "constant", "value": "prod"}],
                    "children": [
                        {"title": "panel", "state": {"expr": "up{env=\"$env\"}"}},
                        {"title": "collapsed", "active": false}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_builds_tree() {
        let scene = BuildScene::new().execute(definition()).unwrap();
        let root = scene.root();
        assert_eq!(scene.title(), "ops");
        assert_eq!(scene.node_count(), 3);

        let scope = scene.scope_of(root).unwrap().unwrap();
        assert_eq!(
            scene.variable(scope, "env").unwrap().value(),
            &VariableValue::from("prod")
        );

        let panel = scene.children_of(root).unwrap()[0];
        assert_eq!(scene.title_of(panel).unwrap(), "panel");
        assert!(scene.tracker(panel).unwrap().is_some());
        assert_eq!(scene.interpolate(panel, "$env").unwrap(), "prod");
    }

    #[test]
    fn test_inactive_flag_survives() {
        let mut scene = BuildScene::new().execute(definition()).unwrap();
        let root = scene.root();
        scene.activate_subtree(root).unwrap();
        let children = scene.children_of(root).unwrap().to_vec();
        assert!(scene.is_active(children[0]).unwrap());
        assert!(!scene.is_active(children[1]).unwrap());
    }

    #[test]
    fn test_rejects_invalid_names() {
        let mut definition = definition();
        definition.root.variables[0].name = "not valid".into();
        assert!(matches!(
            BuildScene::new().execute(definition),
            Err(BuildSceneError::Invalid(DomainError::InvalidVariableName(_)))
        ));
    }
}
