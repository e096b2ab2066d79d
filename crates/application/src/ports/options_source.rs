//! Options source port
//!
//! The asynchronous producer behind query variables.

use async_trait::async_trait;
use cascade_domain::{TimeRange, VariableOption};

/// Errors reported by an options source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source could not answer the query.
    #[error("query failed: {0}")]
    Failed(String),

    /// The source is temporarily unreachable.
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// A request for the options of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsRequest {
    /// Name of the requesting variable.
    pub variable: String,
    /// Query with every resolvable reference interpolated.
    pub query: String,
    /// Nearest time range of the variable's scope.
    pub time_range: Option<TimeRange>,
}

/// Produces the options of query variables.
///
/// A fetch yields at most one option list. `Ok(None)` means the source
/// produced nothing and the variable keeps its state.
#[async_trait]
pub trait OptionsSource: Send + Sync {
    /// Fetches options for a variable.
    ///
    /// # Errors
    /// Returns `SourceError` if the options cannot be produced. The error is
    /// recorded on the variable and does not block its dependents.
    async fn fetch(&self, request: OptionsRequest)
        -> Result<Option<Vec<VariableOption>>, SourceError>;
}
