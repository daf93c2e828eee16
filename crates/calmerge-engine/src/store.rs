//! Persistence collaborator contracts.
//!
//! The merge engine talks to the outside world only through these traits.
//! All implementations must satisfy these invariants:
//! - `load_events_involving` is deterministic for a fixed store state
//!   (ordered by start time, then id); group discovery and tie-breaking
//!   depend on a reproducible load order.
//! - `commit_merge` is all-or-nothing: on failure no deleted source, no
//!   inserted product, and no audit row may be observable.
//! - All persistence errors are propagated, never silently ignored.

use calmerge_core::{AuditLog, Event, EventDraft, NewAuditLog};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Event not found.
    #[error("event not found: {0}")]
    EventNotFound(String),

    /// Audit log not found.
    #[error("audit log not found: {0}")]
    AuditLogNotFound(String),

    /// The backend could not complete an atomic unit of work.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
}

/// Lookup of known users, consulted before any events are loaded.
pub trait UserDirectory: Send + Sync {
    /// Check whether the given id resolves to a real user.
    fn user_exists(&self, user_id: &str) -> StoreResult<bool>;
}

/// Event persistence.
pub trait EventStore: Send + Sync {
    /// Load every event where the user is creator or invitee.
    fn load_events_involving(&self, user_id: &str) -> StoreResult<Vec<Event>>;

    /// Insert a draft, assigning its id and timestamps.
    fn insert_event(&self, draft: EventDraft) -> StoreResult<Event>;

    /// Delete the given events. Fails without deleting anything when any id
    /// is unknown.
    fn delete_events(&self, ids: &[String]) -> StoreResult<()>;
}

/// Durable record of merge operations.
pub trait AuditSink: Send + Sync {
    /// Create the audit row for one merge; notes start out empty.
    fn create_audit_log(&self, new: NewAuditLog) -> StoreResult<AuditLog>;

    /// Attach summary text to an existing audit row.
    fn update_audit_notes(&self, id: &str, notes: &str) -> StoreResult<()>;
}

/// The persistence contract the orchestrator commits through.
pub trait MergeStore: EventStore + AuditSink {
    /// Atomically replace the merged group with the synthesized event and
    /// record the audit row.
    ///
    /// A backend that cannot guarantee atomicity must fail the commit
    /// instead of leaving a mix of deleted sources and a missing target.
    fn commit_merge(
        &self,
        user_id: &str,
        merged_ids: &[String],
        draft: EventDraft,
    ) -> StoreResult<(Event, AuditLog)>;
}
