//! Reserved macro names
//!
//! Macros stand in for variables that are never stored: they are computed
//! from the scope's context on each resolution.

use cascade_domain::interpolation::{ALL_VARIABLES_MACRO, VariableFormat};
use cascade_domain::{TimeRange, Variable};

/// Information about a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInfo {
    /// Macro name without `$`.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

/// Every macro the resolver knows.
pub const MACROS: &[MacroInfo] = &[
    MacroInfo {
        name: "__from",
        description: "Start of the nearest time range in epoch milliseconds",
    },
    MacroInfo {
        name: "__to",
        description: "End of the nearest time range in epoch milliseconds",
    },
    MacroInfo {
        name: "__timezone",
        description: "Timezone of the nearest time range",
    },
    MacroInfo {
        name: ALL_VARIABLES_MACRO,
        description: "Query string of every URL-synced variable in scope",
    },
];

/// Resolves a macro. Returns `None` for unknown names, and for time macros
/// when no time range is in scope.
pub(crate) fn resolve<'a, F>(
    name: &str,
    time_range: Option<&TimeRange>,
    variables: F,
) -> Option<String>
where
    F: FnOnce() -> Vec<&'a Variable>,
{
    match name {
        "__from" => time_range.map(|range| range.from_millis().to_string()),
        "__to" => time_range.map(|range| range.to_millis().to_string()),
        "__timezone" => time_range.map(|range| range.timezone.clone()),
        ALL_VARIABLES_MACRO => Some(all_variables_query(&variables())),
        _ => None,
    }
}

/// `var-a=1&var-b=x&var-b=y` for the given variables, raw values.
fn all_variables_query(variables: &[&Variable]) -> String {
    variables
        .iter()
        .map(|variable| {
            let mut values = variable.value().to_list();
            if values.is_empty() {
                values.push(String::new());
            }
            VariableFormat::QueryParam.apply(variable.name(), &values)
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn range() -> TimeRange {
        TimeRange::new(
            Utc.timestamp_millis_opt(1_000).unwrap(),
            Utc.timestamp_millis_opt(5_000).unwrap(),
        )
        .unwrap()
        .with_timezone("UTC")
    }

    #[test]
    fn test_time_macros() {
        let range = range();
        assert_eq!(resolve("__from", Some(&range), Vec::new), Some("1000".into()));
        assert_eq!(resolve("__to", Some(&range), Vec::new), Some("5000".into()));
        assert_eq!(resolve("__timezone", Some(&range), Vec::new), Some("UTC".into()));
        assert_eq!(resolve("__from", None, Vec::new), None);
    }

    #[test]
    fn test_unknown_macro() {
        assert_eq!(resolve("__interval", None, Vec::new), None);
    }

    #[test]
    fn test_all_variables() {
        let env = Variable::constant("env", "prod");
        let host = Variable::custom("host", "").with_value(vec!["a", "b"], vec!["a", "b"]);
        let empty = Variable::text_box("q", "");
        let out = resolve(ALL_VARIABLES_MACRO, None, || vec![&env, &host, &empty]);
        assert_eq!(out.as_deref(), Some("var-env=prod&var-host=a&var-host=b&var-q="));
    }

    #[test]
    fn test_macro_names_are_reserved() {
        assert!(MACROS.iter().all(|m| m.name.starts_with("__")));
    }
}
