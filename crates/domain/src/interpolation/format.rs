//! Value formats for interpolation.

use serde_json::Value;

use crate::variable::{ALL_VARIABLE_TEXT, Variable, VariableValue};

/// How a variable value is rendered into a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableFormat {
    /// `{a,b}` for several values, the value itself otherwise.
    #[default]
    Glob,
    /// `a,b`
    Csv,
    /// `a|b`
    Pipe,
    /// Values joined with commas, no escaping.
    Raw,
    /// Display text instead of value, joined with ` + `.
    Text,
    /// JSON string or array.
    Json,
    /// Regex-escaped, `(a|b)` for several values.
    Regex,
    /// `var-name=a&var-name=b`
    QueryParam,
}

impl VariableFormat {
    /// Looks up a format by its reference name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "glob" => Some(Self::Glob),
            "csv" => Some(Self::Csv),
            "pipe" => Some(Self::Pipe),
            "raw" => Some(Self::Raw),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "regex" => Some(Self::Regex),
            "queryparam" => Some(Self::QueryParam),
            _ => None,
        }
    }

    /// Renders a list of values.
    #[must_use]
    pub fn apply(self, name: &str, values: &[String]) -> String {
        match self {
            Self::Glob if values.len() > 1 => format!("{{{}}}", values.join(",")),
            Self::Glob | Self::Csv | Self::Raw => values.join(","),
            Self::Pipe => values.join("|"),
            Self::Text => values.join(" + "),
            Self::Json => match values {
                [single] => Value::String(single.clone()).to_string(),
                _ => Value::from(values.to_vec()).to_string(),
            },
            Self::Regex => {
                let escaped: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
                match escaped.as_slice() {
                    [single] => single.clone(),
                    _ => format!("({})", escaped.join("|")),
                }
            }
            Self::QueryParam => values
                .iter()
                .map(|v| format!("var-{name}={v}"))
                .collect::<Vec<_>>()
                .join("&"),
        }
    }
}

/// Renders a variable for a reference with optional field path and format.
///
/// An All selection expands to the custom All value when one is set, else
/// to every option value.
#[must_use]
pub fn format_variable(variable: &Variable, field_path: Option<&str>, format: Option<&str>) -> String {
    let format = format.and_then(VariableFormat::from_name).unwrap_or_default();

    if let Some(path) = field_path {
        return field_value(variable, path).unwrap_or_default();
    }

    if format == VariableFormat::Text {
        let texts = if variable.value().is_all() {
            vec![ALL_VARIABLE_TEXT.to_string()]
        } else {
            variable.text().to_list()
        };
        return format.apply(variable.name(), &texts);
    }

    if variable.value().is_all() {
        if let Some(all_value) = variable.all_value() {
            return all_value.to_string();
        }
        let values: Vec<String> = variable.options().iter().map(|o| o.value.clone()).collect();
        return format.apply(variable.name(), &values);
    }

    format.apply(variable.name(), &variable.value().to_list())
}

fn field_value(variable: &Variable, path: &str) -> Option<String> {
    let root = match variable.value() {
        VariableValue::Custom(value) => value,
        _ => variable.selected_option()?.properties.as_ref()?,
    };
    let found = path
        .split('.')
        .try_fold(root, |current, key| match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })?;
    Some(match found {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
