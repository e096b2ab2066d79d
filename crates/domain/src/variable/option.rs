//! Selectable variable options.

use serde::{Deserialize, Serialize};

/// One selectable option of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    /// Display label.
    pub label: String,
    /// Value used for interpolation.
    pub value: String,
    /// Extra fields reachable through `${name.path}` references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl VariableOption {
    /// Creates an option with distinct label and value.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            properties: None,
        }
    }

    /// Creates an option whose label equals its value.
    #[must_use]
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    /// Attaches extra properties.
    #[must_use]
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = Some(properties);
        self
    }
}
