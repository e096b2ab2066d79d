//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A variable name is empty or contains characters a reference cannot match.
    #[error("invalid variable name: {0:?}")]
    InvalidVariableName(String),

    /// A variable with the same name already exists in the scope.
    #[error("duplicate variable: {0}")]
    DuplicateVariable(String),

    /// A time range ends before it starts.
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// A scene definition is structurally invalid.
    #[error("invalid scene definition: {0}")]
    InvalidDefinition(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
