//! Serializable scene definition.
//!
//! A scene file describes a consumer tree: each node may carry consumer state
//! to scan for references, a time range and a scope of variables. Static
//! option tables for query sources live at the top level.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::interpolation::is_valid_variable_name;
use crate::time_range::TimeRange;
use crate::variable::{Variable, VariableKind, VariableOption, VariableValue};

/// Current scene file schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Options served by a static source, keyed by interpolated query.
pub type StaticOptions = BTreeMap<String, Vec<VariableOption>>;

/// Root of a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Scene title.
    #[serde(default)]
    pub title: String,

    /// Static options sources by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, StaticOptions>,

    /// Root node of the consumer tree.
    pub root: NodeDefinition,
}

const fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl SceneDefinition {
    /// Creates a scene with the given root node.
    #[must_use]
    pub fn new(title: impl Into<String>, root: NodeDefinition) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            title: title.into(),
            sources: BTreeMap::new(),
            root,
        }
    }

    /// Checks every node of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first invalid or duplicate variable name found, or
    /// [`DomainError::InvalidDefinition`] for an unsupported schema version.
    pub fn validate(&self) -> DomainResult<()> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(DomainError::InvalidDefinition(format!(
                "unsupported schema version {}",
                self.schema_version
            )));
        }
        self.root.validate()
    }
}

/// One consumer node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Display title.
    #[serde(default)]
    pub title: String,

    /// Whether the node starts active.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Consumer state scanned for variable references.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub state: Map<String, Value>,

    /// Restricts scanning to these top-level state fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_paths: Option<Vec<String>>,

    /// Variables of the node's own scope. No scope is created when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDefinition>,

    /// Time range owned by this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,

    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

const fn default_active() -> bool {
    true
}

impl NodeDefinition {
    /// Creates an active node with nothing attached.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            active: true,
            state: Map::new(),
            state_paths: None,
            variables: Vec::new(),
            time_range: None,
            children: Vec::new(),
        }
    }

    /// Checks variable names in this node and its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidVariableName`] or
    /// [`DomainError::DuplicateVariable`].
    pub fn validate(&self) -> DomainResult<()> {
        let mut seen = HashSet::new();
        for variable in &self.variables {
            if !is_valid_variable_name(&variable.name) {
                return Err(DomainError::InvalidVariableName(variable.name.clone()));
            }
            if !seen.insert(variable.name.as_str()) {
                return Err(DomainError::DuplicateVariable(variable.name.clone()));
            }
        }
        self.children.iter().try_for_each(Self::validate)
    }
}

/// One variable as written in a scene file.
///
/// The kind is flattened, so `type` sits next to the common fields:
///
/// ```
/// use cascade_domain::VariableDefinition;
///
/// let def: VariableDefinition = serde_json::from_str(
///     r#"{"name": "host", "type": "custom", "query": "a, b", "multi": true}"#,
/// ).unwrap();
/// assert!(def.into_variable().is_multi());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Variable name.
    pub name: String,

    /// Kind and kind-specific fields.
    #[serde(flatten)]
    pub kind: VariableKind,

    /// Initial value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VariableValue>,

    /// Initial text. Defaults to the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<VariableValue>,

    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Allows selecting several values.
    #[serde(default)]
    pub multi: bool,

    /// Offers the All option.
    #[serde(default)]
    pub include_all: bool,

    /// Falls back to All instead of the first option.
    #[serde(default)]
    pub default_to_all: bool,

    /// Raw value interpolated for an All selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,

    /// Never revalidates automatically.
    #[serde(default)]
    pub lazy: bool,

    /// Excluded from URL state and `__all_variables`.
    #[serde(default)]
    pub skip_url_sync: bool,

    /// Initially known options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<VariableOption>,
}

impl VariableDefinition {
    /// Builds the runtime variable.
    #[must_use]
    pub fn into_variable(self) -> Variable {
        let mut variable = Variable::new(self.name, self.kind).with_options(self.options);
        if let Some(value) = self.value {
            let text = self.text.unwrap_or_else(|| value.clone());
            variable = variable.with_value(value, text);
        }
        if let Some(label) = self.label {
            variable = variable.with_label(label);
        }
        if let Some(all_value) = self.all_value {
            variable = variable.with_all_value(all_value);
        }
        if self.multi {
            variable = variable.multi();
        }
        if self.include_all {
            variable = variable.include_all();
        }
        if self.default_to_all {
            variable = variable.default_to_all();
        }
        if self.lazy {
            variable = variable.lazy();
        }
        if self.skip_url_sync {
            variable = variable.skip_url_sync();
        }
        variable
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::variable::VariableRefresh;
    use pretty_assertions::assert_eq;

    const SCENE: &str = r#"{
        "title": "Cascade",
        "sources": {"metrics": {"A.*": [{"label": "AA", "value": "AA"}]}},
        "root": {
            "title": "dashboard",
            "variables": [
                {"name": "A", "type": "query", "source": "metrics", "query": "A.*"},
                {"name": "env", "type": "constant", "value": "prod"}
            ],
            "children": [
                {"title": "panel", "active": false, "state": {"expr": "$A"}}
            ]
        }
    }"#;

    #[test]
    fn test_deserialize_scene() {
        let scene: SceneDefinition = serde_json::from_str(SCENE).unwrap();
        assert_eq!(scene.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(scene.sources["metrics"]["A.*"].len(), 1);
        assert!(scene.root.active);
        assert!(!scene.root.children[0].active);
        assert_eq!(
            scene.root.variables[0].kind,
            VariableKind::Query {
                source: "metrics".into(),
                query: "A.*".into(),
                refresh: VariableRefresh::OnLoad,
            }
        );
        scene.validate().unwrap();
    }

    #[test]
    fn test_into_variable_defaults_text_to_value() {
        let scene: SceneDefinition = serde_json::from_str(SCENE).unwrap();
        let env = scene.root.variables[1].clone().into_variable();
        assert_eq!(env.value(), &VariableValue::from("prod"));
        assert_eq!(env.text(), &VariableValue::from("prod"));
    }

    #[test]
    fn test_validate_duplicate() {
        let mut node = NodeDefinition::new("root");
        let def: VariableDefinition =
            serde_json::from_str(r#"{"name": "a", "type": "text_box"}"#).unwrap();
        node.variables = vec![def.clone(), def];
        assert_eq!(
            node.validate(),
            Err(DomainError::DuplicateVariable("a".into()))
        );
    }

    #[test]
    fn test_validate_nested_invalid_name() {
        let mut child = NodeDefinition::new("child");
        child.variables.push(
            serde_json::from_str(r#"{"name": "bad-name", "type": "local", "value": "x"}"#).unwrap(),
        );
        let mut root = NodeDefinition::new("root");
        root.children.push(child);
        assert_eq!(
            SceneDefinition::new("s", root).validate(),
            Err(DomainError::InvalidVariableName("bad-name".into()))
        );
    }

    #[test]
    fn test_future_schema_rejected() {
        let mut scene = SceneDefinition::new("s", NodeDefinition::new("root"));
        scene.schema_version = CURRENT_SCHEMA_VERSION + 1;
        assert!(matches!(scene.validate(), Err(DomainError::InvalidDefinition(_))));
    }
}
