//! File-based persistence adapters.

mod file_system;
mod scene_repository;

pub use file_system::TokioFileSystem;
pub use scene_repository::{FileSceneRepository, SceneFormat};
