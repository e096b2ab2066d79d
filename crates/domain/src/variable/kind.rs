//! Variable kinds.

use serde::{Deserialize, Serialize};

/// When a query variable reloads its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRefresh {
    /// Options load once; later activations reuse them.
    Never,
    /// Options reload whenever the owning scope activates.
    #[default]
    OnLoad,
    /// Like `OnLoad`, and also whenever the nearest time range changes.
    OnTimeRangeChanged,
}

/// The closed set of variable kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariableKind {
    /// Options come from a named asynchronous options source.
    Query {
        /// Key of the options source in the scene's registry.
        source: String,
        /// Query handed to the source after interpolation.
        query: String,
        /// Reload policy.
        #[serde(default)]
        refresh: VariableRefresh,
    },
    /// Options are parsed from a comma-separated list.
    Custom {
        /// `a, b, label : value` list, interpolated before parsing.
        query: String,
    },
    /// A fixed value that never revalidates.
    Constant,
    /// A free-form value typed by the user.
    TextBox,
    /// A scope-local value shadowing a same-named ancestor variable.
    Local,
}

impl VariableKind {
    /// Short name for logs.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Query { .. } => "query",
            Self::Custom { .. } => "custom",
            Self::Constant => "constant",
            Self::TextBox => "textbox",
            Self::Local => "local",
        }
    }

    /// Returns true if the kind reconciles its value against loaded options.
    #[must_use]
    pub const fn has_options(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::Custom { .. })
    }

    /// Returns the refresh policy. Only query variables have one.
    #[must_use]
    pub const fn refresh(&self) -> VariableRefresh {
        match self {
            Self::Query { refresh, .. } => *refresh,
            _ => VariableRefresh::OnLoad,
        }
    }

    /// Returns the query text, if the kind has one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Query { query, .. } | Self::Custom { query } => Some(query),
            _ => None,
        }
    }

    /// Fields of the definition that may reference other variables.
    #[must_use]
    pub fn referencing_fields(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        match self {
            Self::Query { source, query, .. } => {
                fields.insert("source".into(), source.clone().into());
                fields.insert("query".into(), query.clone().into());
            }
            Self::Custom { query } => {
                fields.insert("query".into(), query.clone().into());
            }
            Self::Constant | Self::TextBox | Self::Local => {}
        }
        fields
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let kind: VariableKind = serde_json::from_str(
            r#"{"type":"query","source":"metrics","query":"A.*","refresh":"on_time_range_changed"}"#,
        )
        .unwrap();
        assert_eq!(kind.refresh(), VariableRefresh::OnTimeRangeChanged);
        assert_eq!(kind.query(), Some("A.*"));

        let constant: VariableKind = serde_json::from_str(r#"{"type":"constant"}"#).unwrap();
        assert_eq!(constant, VariableKind::Constant);
    }

    #[test]
    fn test_has_options() {
        assert!(VariableKind::Custom { query: "a,b".into() }.has_options());
        assert!(!VariableKind::TextBox.has_options());
        assert!(!VariableKind::Local.has_options());
    }

    #[test]
    fn test_referencing_fields() {
        let kind = VariableKind::Query {
            source: "ds".into(),
            query: "$A".into(),
            refresh: VariableRefresh::OnLoad,
        };
        let fields = kind.referencing_fields();
        assert_eq!(fields.get("query").and_then(|v| v.as_str()), Some("$A"));
        assert!(VariableKind::Constant.referencing_fields().is_empty());
    }
}
