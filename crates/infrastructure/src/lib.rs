//! Cascade Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::{StaticOptionsSource, static_sources};
pub use persistence::{FileSceneRepository, SceneFormat, TokioFileSystem};
pub use serialization::{SerializationError, from_json, from_yaml, to_json_stable};
