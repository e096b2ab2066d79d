//! Scene file serialization.
//!
//! JSON output is deterministic so printed reports diff cleanly:
//! - 2-space indentation
//! - trailing newline
//! - map keys sorted (`BTreeMap` in domain types)
//!
//! YAML is accepted for hand-written scenes.

mod json;
mod yaml;

pub use json::{from_json, to_json_stable};
pub use yaml::from_yaml;

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serializer produced invalid UTF-8.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
