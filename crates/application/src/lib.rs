//! Cascade Application - Scheduling core, ports and use cases
//!
//! This crate defines the application layer with:
//! - Port traits (options sources, file system, scene persistence)
//! - The scene arena: consumer tree, variable scopes and their scheduler
//! - Use case orchestration
//! - Application-level error handling

pub mod error;
pub mod ports;
pub mod scene;
pub mod use_cases;

pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    FileSystem, FileSystemError, OptionsRequest, OptionsSource, SceneRepository,
    SceneRepositoryError, SourceError,
};
pub use scene::{MACROS, MacroInfo, Scene, VariableChanged};
pub use use_cases::{BuildScene, BuildSceneError, LoadScene, LoadSceneError};
