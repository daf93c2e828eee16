//! In-memory reference backend.
//!
//! Intended for tests and embedding. All state lives behind `RwLock`s and
//! values are cloned on read/write. `commit_merge` holds both write locks
//! for the whole delete+insert+audit step, so every other caller observes
//! it atomically.

use crate::error::Result;
use crate::store::{AuditSink, EventStore, MergeStore, StoreError, StoreResult, UserDirectory};
use calmerge_core::{AuditLog, Event, EventDraft, EventPatch, NewAuditLog};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

fn next_event_id() -> String {
    format!("evt_{}", Uuid::new_v4().as_simple())
}

fn next_audit_id() -> String {
    format!("aud_{}", Uuid::new_v4().as_simple())
}

/// HashMap-backed implementation of every persistence contract.
pub struct InMemoryBackend {
    users: RwLock<HashSet<String>>,
    events: RwLock<HashMap<String, Event>>,
    audit_logs: RwLock<HashMap<String, AuditLog>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashSet::new()),
            events: RwLock::new(HashMap::new()),
            audit_logs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a user with the directory.
    pub fn register_user(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.users.write().expect("lock poisoned").insert(user_id.clone());
        debug!(user = %user_id, "registered user");
    }

    /// Validate and insert a caller-supplied draft.
    ///
    /// # Errors
    /// Returns a validation error when the draft violates the creation
    /// invariants, or a persistence error from the insert.
    pub fn create_event(&self, draft: EventDraft) -> Result<Event> {
        draft.validate()?;
        Ok(self.insert_event(draft)?)
    }

    /// Apply a partial update to a stored event, re-validating time and
    /// invitee changes.
    ///
    /// # Errors
    /// Returns a persistence error when the event is unknown, or a
    /// validation error when the patch violates the creation invariants
    /// (the event is left unchanged).
    pub fn update_event(&self, id: &str, patch: EventPatch) -> Result<Event> {
        let mut events = self.events.write().expect("lock poisoned");
        let event = events
            .get_mut(id)
            .ok_or_else(|| StoreError::EventNotFound(id.to_string()))?;
        event.apply_patch(patch)?;
        info!(event = %id, "updated event");
        Ok(event.clone())
    }

    /// Fetch an event by id.
    #[must_use]
    pub fn get_event(&self, id: &str) -> Option<Event> {
        self.events.read().expect("lock poisoned").get(id).cloned()
    }

    /// Fetch an audit log by id.
    #[must_use]
    pub fn get_audit_log(&self, id: &str) -> Option<AuditLog> {
        self.audit_logs
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned()
    }

    /// Number of events currently stored.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.read().expect("lock poisoned").len()
    }

    /// Number of audit rows currently stored.
    #[must_use]
    pub fn audit_count(&self) -> usize {
        self.audit_logs.read().expect("lock poisoned").len()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl UserDirectory for InMemoryBackend {
    fn user_exists(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.users.read().expect("lock poisoned").contains(user_id))
    }
}

impl EventStore for InMemoryBackend {
    fn load_events_involving(&self, user_id: &str) -> StoreResult<Vec<Event>> {
        let events = self.events.read().expect("lock poisoned");
        let mut involved: Vec<Event> = events
            .values()
            .filter(|e| e.involves(user_id))
            .cloned()
            .collect();
        // Reproducible order; grouping and tie-breaks depend on it.
        involved.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(involved)
    }

    fn insert_event(&self, draft: EventDraft) -> StoreResult<Event> {
        let event = draft.into_event(next_event_id(), Utc::now());
        let mut events = self.events.write().expect("lock poisoned");
        events.insert(event.id.clone(), event.clone());
        debug!(event = %event.id, "inserted event");
        Ok(event)
    }

    fn delete_events(&self, ids: &[String]) -> StoreResult<()> {
        let mut events = self.events.write().expect("lock poisoned");
        for id in ids {
            if !events.contains_key(id) {
                return Err(StoreError::EventNotFound(id.clone()));
            }
        }
        for id in ids {
            events.remove(id);
        }
        debug!(count = ids.len(), "deleted events");
        Ok(())
    }
}

impl AuditSink for InMemoryBackend {
    fn create_audit_log(&self, new: NewAuditLog) -> StoreResult<AuditLog> {
        let log = new.into_audit_log(next_audit_id(), Utc::now());
        let mut audit_logs = self.audit_logs.write().expect("lock poisoned");
        audit_logs.insert(log.id.clone(), log.clone());
        debug!(audit_log = %log.id, "created audit log");
        Ok(log)
    }

    fn update_audit_notes(&self, id: &str, notes: &str) -> StoreResult<()> {
        let mut audit_logs = self.audit_logs.write().expect("lock poisoned");
        let log = audit_logs
            .get_mut(id)
            .ok_or_else(|| StoreError::AuditLogNotFound(id.to_string()))?;
        log.notes = Some(notes.to_string());
        debug!(audit_log = %id, "attached audit notes");
        Ok(())
    }
}

impl MergeStore for InMemoryBackend {
    fn commit_merge(
        &self,
        user_id: &str,
        merged_ids: &[String],
        draft: EventDraft,
    ) -> StoreResult<(Event, AuditLog)> {
        let mut events = self.events.write().expect("lock poisoned");
        let mut audit_logs = self.audit_logs.write().expect("lock poisoned");

        // Verify before mutating; a missing source must leave the store
        // untouched.
        for id in merged_ids {
            if !events.contains_key(id) {
                return Err(StoreError::EventNotFound(id.clone()));
            }
        }

        for id in merged_ids {
            events.remove(id);
        }
        let event = draft.into_event(next_event_id(), Utc::now());
        events.insert(event.id.clone(), event.clone());

        let log = NewAuditLog::new(user_id, event.id.clone(), merged_ids.to_vec())
            .into_audit_log(next_audit_id(), Utc::now());
        audit_logs.insert(log.id.clone(), log.clone());

        info!(
            user = %user_id,
            event = %event.id,
            merged = merged_ids.len(),
            "committed merge"
        );
        Ok((event, log))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("event_count", &self.event_count())
            .field("audit_count", &self.audit_count())
            .finish()
    }
}
