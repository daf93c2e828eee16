//! Merge audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one merge operation.
///
/// Created once per merge with empty notes; the notes field is populated at
/// most once afterwards, by whichever summarization path ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    /// Unique identifier (e.g., "aud_9c04...").
    pub id: String,

    /// The participant who invoked the merge.
    pub user_id: String,

    /// The event produced by the merge.
    pub new_event_id: String,

    /// Source event ids consumed by the merge, in ascending-start order.
    pub merged_event_ids: Vec<String>,

    /// Summary text; `None` until a summarizer (or the fallback) wrote one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the merge was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an audit log row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAuditLog {
    /// The participant who invoked the merge.
    pub user_id: String,

    /// The event produced by the merge.
    pub new_event_id: String,

    /// Source event ids consumed by the merge.
    pub merged_event_ids: Vec<String>,
}

impl NewAuditLog {
    /// Create the input record for one merge.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        new_event_id: impl Into<String>,
        merged_event_ids: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            new_event_id: new_event_id.into(),
            merged_event_ids,
        }
    }

    /// Materialize the audit row with a store-assigned id. Notes always
    /// start out empty.
    #[must_use]
    pub fn into_audit_log(self, id: impl Into<String>, now: DateTime<Utc>) -> AuditLog {
        AuditLog {
            id: id.into(),
            user_id: self.user_id,
            new_event_id: self.new_event_id,
            merged_event_ids: self.merged_event_ids,
            notes: None,
            created_at: now,
        }
    }
}
