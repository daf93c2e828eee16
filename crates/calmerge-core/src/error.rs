//! Error types for calmerge-core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for calmerge-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in calmerge-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Event time range is inverted or empty.
    #[error("invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Creator listed among the invitees.
    #[error("creator '{0}' cannot also be an invitee")]
    CreatorIsInvitee(String),

    /// Invitee id appears more than once.
    #[error("duplicate invitee: {0}")]
    DuplicateInvitee(String),

    /// Merge validation error.
    #[error("validation error: {0}")]
    Validation(String),
}
