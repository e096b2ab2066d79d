//! Load scene use case

use std::path::Path;

use cascade_domain::SceneDefinition;

use crate::ports::{SceneRepository, SceneRepositoryError};

/// Errors that can occur when loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum LoadSceneError {
    /// Scene file not found.
    #[error("Scene not found: {0}")]
    NotFound(String),

    /// Failed to read the scene file.
    #[error("Failed to read scene file: {0}")]
    IoError(String),

    /// Failed to parse the scene file.
    #[error("Failed to parse scene file: {0}")]
    ParseError(String),
}

impl From<SceneRepositoryError> for LoadSceneError {
    fn from(error: SceneRepositoryError) -> Self {
        match error {
            SceneRepositoryError::NotFound(path) => Self::NotFound(path),
            SceneRepositoryError::Io(e) => Self::IoError(e),
            SceneRepositoryError::Serialization(e) | SceneRepositoryError::UnsupportedFormat(e) => {
                Self::ParseError(e)
            }
        }
    }
}

/// Loads and validates a scene definition.
pub struct LoadScene<R> {
    repository: R,
}

impl<R: SceneRepository> LoadScene<R> {
    /// Creates a new `LoadScene` use case.
    pub const fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Executes the use case.
    ///
    /// # Errors
    /// Returns an error if the scene cannot be read or fails validation.
    pub async fn execute(&self, path: &Path) -> Result<SceneDefinition, LoadSceneError> {
        let definition = self.repository.load(path).await?;
        definition
            .validate()
            .map_err(|e| LoadSceneError::ParseError(e.to_string()))?;
        Ok(definition)
    }
}
