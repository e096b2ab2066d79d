//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the scheduling core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod file_system;
mod options_source;
mod scene_repository;

pub use file_system::{FileSystem, FileSystemError};
pub use options_source::{OptionsRequest, OptionsSource, SourceError};
pub use scene_repository::{SceneRepository, SceneRepositoryError};
