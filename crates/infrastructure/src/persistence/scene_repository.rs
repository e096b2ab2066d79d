//! File-based scene repository implementation.
//!
//! Scenes are stored as JSON (`.json`) or YAML (`.yaml`, `.yml`) files.

use std::path::Path;

use async_trait::async_trait;
use cascade_application::ports::{
    FileSystem, FileSystemError, SceneRepository, SceneRepositoryError,
};
use cascade_domain::SceneDefinition;
use tracing::debug;

use crate::serialization::{from_json, from_yaml};

/// On-disk scene formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl SceneFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    /// Returns `SceneRepositoryError::UnsupportedFormat` for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, SceneRepositoryError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(SceneRepositoryError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

fn to_repository_error(e: FileSystemError) -> SceneRepositoryError {
    match e {
        FileSystemError::NotFound(path) => SceneRepositoryError::NotFound(path.display().to_string()),
        other => SceneRepositoryError::Io(other.to_string()),
    }
}

/// File-based scene repository.
#[derive(Debug, Clone)]
pub struct FileSceneRepository<F> {
    fs: F,
}

impl<F: FileSystem> FileSceneRepository<F> {
    /// Creates a new file-based scene repository.
    pub const fn new(fs: F) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl<F: FileSystem> SceneRepository for FileSceneRepository<F> {
    async fn load(&self, path: &Path) -> Result<SceneDefinition, SceneRepositoryError> {
        let format = SceneFormat::from_path(path)?;
        if !self.fs.is_file(path).await {
            return Err(SceneRepositoryError::NotFound(path.display().to_string()));
        }

        let content = self
            .fs
            .read_file_string(path)
            .await
            .map_err(to_repository_error)?;

        let scene: SceneDefinition = match format {
            SceneFormat::Json => from_json(&content),
            SceneFormat::Yaml => from_yaml(&content),
        }
        .map_err(|e| SceneRepositoryError::Serialization(e.to_string()))?;

        debug!(path = %path.display(), title = %scene.title, "scene loaded");
        Ok(scene)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::TokioFileSystem;
    use cascade_domain::{NodeDefinition, VariableDefinition};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const JSON: &str = r#"{
        "title": "ops",
        "root": {
            "title": "dashboard",
            "variables": [{"name": "env", "type": "custom", "query": "dev, prod"}],
            "children": [{"title": "panel"}]
        }
    }"#;

    const YAML: &str = "
title: ops
root:
  title: dashboard
  variables:
    - { name: env, type: custom, query: 'dev, prod' }
  children:
    - title: panel
";

    fn expected() -> SceneDefinition {
        let mut root = NodeDefinition::new("dashboard");
        let variable: VariableDefinition =
            serde_json::from_str(r#"{"name": "env", "type": "custom", "query": "dev, prod"}"#)
                .unwrap();
        root.variables.push(variable);
        root.children.push(NodeDefinition::new("panel"));
        SceneDefinition::new("ops", root)
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SceneFormat::from_path(Path::new("a.json")).unwrap(), SceneFormat::Json);
        assert_eq!(SceneFormat::from_path(Path::new("a.yml")).unwrap(), SceneFormat::Yaml);
        assert!(SceneFormat::from_path(Path::new("a.toml")).is_err());
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.json");
        std::fs::write(&path, JSON).unwrap();
        let repo = FileSceneRepository::new(TokioFileSystem::new());

        assert_eq!(repo.load(&path).await.unwrap(), expected());
    }

    #[tokio::test]
    async fn test_load_yaml_matches_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.yml");
        std::fs::write(&path, YAML).unwrap();
        let repo = FileSceneRepository::new(TokioFileSystem::new());

        assert_eq!(repo.load(&path).await.unwrap(), expected());
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.toml");
        std::fs::write(&path, "title = 'ops'").unwrap();
        let repo = FileSceneRepository::new(TokioFileSystem::new());
        let result = repo.load(&path).await;
        assert!(matches!(result, Err(SceneRepositoryError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_missing_scene() {
        let dir = TempDir::new().unwrap();
        let repo = FileSceneRepository::new(TokioFileSystem::new());
        let result = repo.load(&dir.path().join("missing.yml")).await;
        assert!(matches!(result, Err(SceneRepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_scene() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let repo = FileSceneRepository::new(TokioFileSystem::new());
        let result = repo.load(&path).await;
        assert!(matches!(result, Err(SceneRepositoryError::Serialization(_))));
    }
}
