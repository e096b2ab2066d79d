//! Application error types

use thiserror::Error;
use cascade_domain::{DomainError, NodeId, ScopeId};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The node handle does not belong to this scene.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// The scope handle does not belong to this scene.
    #[error("unknown scope: {0}")]
    UnknownScope(ScopeId),

    /// No variable with this name exists in the scope.
    #[error("unknown variable {name} in {scope}")]
    UnknownVariable {
        /// Scope searched.
        scope: ScopeId,
        /// Name looked up.
        name: String,
    },

    /// The node already owns a scope.
    #[error("{0} already has a variable scope")]
    ScopeAlreadyAttached(NodeId),

    /// A query variable names an options source that is not registered.
    #[error("options source not registered: {0}")]
    MissingOptionsSource(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
