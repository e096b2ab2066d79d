//! Settled state of a scene, as printed by the binary.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use cascade_application::{ApplicationResult, Scene};
use cascade_domain::{NodeId, Variable, VariableValue};

/// Snapshot of every node after revalidation went idle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneReport {
    /// Scene title.
    pub title: String,
    /// Nodes in depth-first order.
    pub nodes: Vec<NodeReport>,
}

/// One node of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    /// Node title.
    pub title: String,
    /// Whether the node ended up active.
    pub active: bool,
    /// Variables of the node's own scope.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableReport>,
    /// Consumer state with string fields interpolated.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub state: BTreeMap<String, Value>,
}

/// One variable of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableReport {
    /// Variable name.
    pub name: String,
    /// Current value.
    pub value: VariableValue,
    /// Current display text.
    pub text: VariableValue,
    /// Number of known options.
    pub options: usize,
    /// Last revalidation error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Variable> for VariableReport {
    fn from(variable: &Variable) -> Self {
        Self {
            name: variable.name().to_string(),
            value: variable.value().clone(),
            text: variable.text().clone(),
            options: variable.options().len(),
            error: variable.error().map(str::to_string),
        }
    }
}

impl SceneReport {
    /// Captures the current state of a scene.
    ///
    /// # Errors
    /// Returns an error if the tree is inconsistent.
    pub fn capture(scene: &Scene) -> ApplicationResult<Self> {
        let mut nodes = Vec::with_capacity(scene.node_count());
        collect(scene, scene.root(), &mut nodes)?;
        Ok(Self {
            title: scene.title().to_string(),
            nodes,
        })
    }

    /// Finds a node by title.
    #[must_use]
    pub fn node(&self, title: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|node| node.title == title)
    }
}

impl NodeReport {
    /// Finds a variable by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableReport> {
        self.variables.iter().find(|variable| variable.name == name)
    }
}

fn collect(scene: &Scene, node: NodeId, out: &mut Vec<NodeReport>) -> ApplicationResult<()> {
    let variables = match scene.scope_of(node)? {
        Some(scope) => scene.variables(scope)?.iter().map(VariableReport::from).collect(),
        None => Vec::new(),
    };

    let mut state = BTreeMap::new();
    for (key, value) in scene.state_of(node)?.fields() {
        let value = match value {
            Value::String(text) => Value::String(scene.interpolate(node, text)?),
            other => other.clone(),
        };
        state.insert(key.clone(), value);
    }

    out.push(NodeReport {
        title: scene.title_of(node)?.to_string(),
        active: scene.is_active(node)?,
        variables,
        state,
    });

    for child in scene.children_of(node)? {
        collect(scene, *child, out)?;
    }
    Ok(())
}
