//! Variable values and the All sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value meaning "every available option is selected".
pub const ALL_VARIABLE_VALUE: &str = "$__all";

/// Display text paired with [`ALL_VARIABLE_VALUE`].
pub const ALL_VARIABLE_TEXT: &str = "All";

/// The value (or display text) of a variable.
///
/// Deserializes untagged: a string is `Single`, an array of strings is
/// `Multi`, anything else is an opaque `Custom` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// A single scalar.
    Single(String),
    /// A list of scalars.
    Multi(Vec<String>),
    /// An opaque value with its own formatting (objects, numbers, ...).
    Custom(serde_json::Value),
}

impl VariableValue {
    /// The All sentinel value.
    #[must_use]
    pub fn all() -> Self {
        Self::Single(ALL_VARIABLE_VALUE.to_string())
    }

    /// The display text paired with the All sentinel.
    #[must_use]
    pub fn all_text() -> Self {
        Self::Single(ALL_VARIABLE_TEXT.to_string())
    }

    /// An empty list.
    #[must_use]
    pub const fn empty_multi() -> Self {
        Self::Multi(Vec::new())
    }

    /// Returns true if this is the All sentinel, either bare or as the
    /// first element of a list.
    #[must_use]
    pub fn is_all(&self) -> bool {
        match self {
            Self::Single(value) => value == ALL_VARIABLE_VALUE,
            Self::Multi(values) => values.first().is_some_and(|v| v == ALL_VARIABLE_VALUE),
            Self::Custom(_) => false,
        }
    }

    /// Returns true for an empty string or an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multi(values) => values.is_empty(),
            Self::Custom(value) => value.is_null(),
        }
    }

    /// Returns the value as a list of scalars.
    ///
    /// An empty single value is an empty list; custom values are rendered
    /// as a single entry.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Single(value) if value.is_empty() => Vec::new(),
            Self::Single(value) => vec![value.clone()],
            Self::Multi(values) => values.clone(),
            Self::Custom(value) => vec![custom_to_string(value)],
        }
    }

    /// Returns the first scalar, if any.
    #[must_use]
    pub fn first(&self) -> Option<String> {
        self.to_list().into_iter().next()
    }
}

impl Default for VariableValue {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for VariableValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for VariableValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Multi(values) => f.write_str(&values.join(",")),
            Self::Custom(value) => f.write_str(&custom_to_string(value)),
        }
    }
}

fn custom_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_all_detection() {
        assert!(VariableValue::all().is_all());
        assert!(VariableValue::from(vec![ALL_VARIABLE_VALUE]).is_all());
        assert!(!VariableValue::from(vec!["a", ALL_VARIABLE_VALUE]).is_all());
        assert!(!VariableValue::from("a").is_all());
    }

    #[test]
    fn test_to_list() {
        assert!(VariableValue::default().to_list().is_empty());
        assert_eq!(VariableValue::from("a").to_list(), vec!["a"]);
        assert_eq!(VariableValue::from(vec!["a", "b"]).to_list(), vec!["a", "b"]);
        assert_eq!(
            VariableValue::Custom(serde_json::json!(42)).to_list(),
            vec!["42"]
        );
    }

    #[test]
    fn test_untagged_deserialization() {
        let single: VariableValue = serde_json::from_str(r#""prod""#).unwrap();
        assert_eq!(single, VariableValue::from("prod"));

        let multi: VariableValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(multi, VariableValue::from(vec!["a", "b"]));

        let custom: VariableValue = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert!(matches!(custom, VariableValue::Custom(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(VariableValue::from(vec!["a", "b"]).to_string(), "a,b");
        assert_eq!(VariableValue::from("x").to_string(), "x");
    }
}
