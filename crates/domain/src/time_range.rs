//! Absolute time range attached to a consumer node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A resolved time range. Variables refreshing on time range change are
/// requeued whenever the nearest owning node's range is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range.
    pub from: DateTime<Utc>,
    /// End of the range.
    pub to: DateTime<Utc>,
    /// IANA timezone name used for display, `browser` if unset.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "browser".to_string()
}

impl TimeRange {
    /// Creates a range, rejecting `from` after `to`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTimeRange`] if `from` is after `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Self> {
        if from > to {
            return Err(DomainError::InvalidTimeRange(format!(
                "{} is after {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }
        Ok(Self {
            from,
            to,
            timezone: default_timezone(),
        })
    }

    /// Sets the timezone.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Start as epoch milliseconds.
    #[must_use]
    pub fn from_millis(&self) -> i64 {
        self.from.timestamp_millis()
    }

    /// End as epoch milliseconds.
    #[must_use]
    pub fn to_millis(&self) -> i64 {
        self.to.timestamp_millis()
    }
}
