//! Error types for the merge engine.

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in merge engine operations.
///
/// Summarization problems are deliberately absent: they are caught inside
/// the orchestrator and degrade to a fallback audit note.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The invoking user id does not resolve to a known user.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Core validation or model error.
    #[error("core error: {0}")]
    Core(#[from] calmerge_core::CoreError),

    /// The atomic delete+insert+audit step could not complete.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
