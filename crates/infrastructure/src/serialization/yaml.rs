//! YAML helpers.

use serde::de::DeserializeOwned;

use super::SerializationError;

/// Deserializes YAML from a string.
///
/// # Errors
///
/// Returns an error if the YAML is invalid or doesn't match the expected type.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, SerializationError> {
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use cascade_domain::{SceneDefinition, VariableKind};
    use pretty_assertions::assert_eq;

    const SCENE: &str = "
title: ops
sources:
  metrics:
    'host.*':
      - { label: web, value: web }
root:
  title: dashboard
  variables:
    - name: host
      type: query
      source: metrics
      query: 'host.*'
      multi: true
  children:
    - title: panel
      state:
        expr: 'up{host=~\"$host\"}'
";

    #[test]
    fn test_hand_written_scene() {
        let scene: SceneDefinition = from_yaml(SCENE).unwrap();
        assert_eq!(scene.title, "ops");
        assert_eq!(scene.sources["metrics"]["host.*"].len(), 1);
        assert!(matches!(scene.root.variables[0].kind, VariableKind::Query { .. }));
        assert!(scene.root.variables[0].multi);
        assert_eq!(scene.root.children[0].state["expr"], "up{host=~\"$host\"}");
    }

    #[test]
    fn test_missing_root_rejected() {
        let result: Result<SceneDefinition, _> = from_yaml("title: empty\n");
        assert!(matches!(result, Err(SerializationError::Yaml(_))));
    }
}
