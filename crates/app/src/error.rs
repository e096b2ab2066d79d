//! Binary error type.

use cascade_application::{ApplicationError, BuildSceneError, LoadSceneError};
use cascade_infrastructure::SerializationError;

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Neither `CASCADE_SCENE` nor a path argument was given.
    #[error("no scene file given: set CASCADE_SCENE or pass a path")]
    MissingScene,

    /// The scene file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadSceneError),

    /// The scene could not be assembled.
    #[error(transparent)]
    Build(#[from] BuildSceneError),

    /// A scene operation failed.
    #[error(transparent)]
    Scene(#[from] ApplicationError),

    /// The report could not be written.
    #[error(transparent)]
    Output(#[from] SerializationError),
}
