//! Scene repository port
//!
//! Defines the interface for loading scene definitions.

use async_trait::async_trait;
use std::path::Path;

use cascade_domain::SceneDefinition;

/// Errors that can occur during scene persistence.
#[derive(Debug, thiserror::Error)]
pub enum SceneRepositoryError {
    /// Scene file not found.
    #[error("Scene not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The file extension is neither JSON nor YAML.
    #[error("Unsupported scene format: {0}")]
    UnsupportedFormat(String),
}

/// Repository trait for scene definitions.
#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Loads a scene definition from a file.
    ///
    /// # Errors
    /// Returns `SceneRepositoryError::NotFound` if the file doesn't exist.
    async fn load(&self, path: &Path) -> Result<SceneDefinition, SceneRepositoryError>;
}
