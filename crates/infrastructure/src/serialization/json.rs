//! JSON helpers with deterministic output.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::SerializationError;

/// Serializes a value to pretty JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Deserializes JSON from a string.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, SerializationError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use cascade_domain::{NodeDefinition, SceneDefinition};
    use std::collections::BTreeMap;

    #[test]
    fn test_trailing_newline_and_indent() {
        let scene = SceneDefinition::new("ops", NodeDefinition::new("root"));
        let json = to_json_stable(&scene).unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.contains("\n  \"title\": \"ops\""));
    }

    #[test]
    fn test_sources_sorted() {
        let mut scene = SceneDefinition::new("ops", NodeDefinition::new("root"));
        scene.sources.insert("zebra".into(), BTreeMap::new());
        scene.sources.insert("apple".into(), BTreeMap::new());

        let json = to_json_stable(&scene).unwrap();
        assert!(json.find("apple").unwrap() < json.find("zebra").unwrap());
    }

    #[test]
    fn test_invalid_json() {
        let result: Result<SceneDefinition, _> = from_json(r#"{"root": }"#);
        assert!(matches!(result, Err(SerializationError::Json(_))));
    }
}
