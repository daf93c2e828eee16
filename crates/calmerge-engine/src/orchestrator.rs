//! Merge orchestration.
//!
//! Sequences validation, grouping, synthesis, the atomic persistence
//! commit, and summary dispatch for one user's overlapping events. Each
//! invocation operates on a freshly loaded snapshot; no state is shared
//! across merges.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::store::{MergeStore, UserDirectory};
use crate::summarize::{fallback_note, SummaryJob, SummaryQueue, Summarizer};
use calmerge_core::{
    find_merge_groups, select_group, synthesize, AuditLog, CoreError, Event, EventStatus,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a completed merge: the synthesized event plus the audit view.
///
/// The audit struct is a response-shaping convenience. When the summary was
/// handed to the asynchronous path its `notes` are still empty here;
/// callers that need the text must re-query the audit sink.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The event that replaced the merged group.
    pub event: Event,

    /// The audit record for this merge.
    pub audit: AuditLog,
}

/// Orchestrates merges over injected collaborators.
///
/// The summarizer and queue are optional capabilities: the orchestrator is
/// correct with zero, one, or both wired in, and the fallback note is the
/// only summarization behavior guaranteed in every configuration.
pub struct MergeOrchestrator {
    store: Arc<dyn MergeStore>,
    directory: Arc<dyn UserDirectory>,
    summarizer: Option<Arc<dyn Summarizer>>,
    queue: Option<Arc<dyn SummaryQueue>>,
    config: EngineConfig,
}

impl MergeOrchestrator {
    /// Create an orchestrator over the given store and user directory.
    #[must_use]
    pub fn new(store: Arc<dyn MergeStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            directory,
            summarizer: None,
            queue: None,
            config: EngineConfig::default(),
        }
    }

    /// Wire in a synchronous summarizer.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Wire in an asynchronous summary queue.
    #[must_use]
    pub fn with_queue(mut self, queue: Arc<dyn SummaryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Merge the largest group of overlapping events involving the user.
    ///
    /// Loads every event where the user is creator or invitee, partitions
    /// the non-canceled ones into merge groups, consolidates the largest
    /// group into a single event, and records an audit row.
    ///
    /// # Errors
    /// - `UserNotFound` when the user id is unknown
    /// - `Core` validation errors: fewer than 2 events, a batch over the
    ///   configured ceiling, fewer than 2 active events, no overlapping
    ///   group
    /// - `Persistence` when the atomic commit fails
    ///
    /// Summarization problems never fail the merge; they only affect the
    /// audit notes.
    pub fn merge_all(&self, user_id: &str) -> Result<MergeOutcome> {
        if !self.directory.user_exists(user_id)? {
            return Err(EngineError::UserNotFound(user_id.to_string()));
        }

        let events = self.store.load_events_involving(user_id)?;
        debug!(user = %user_id, count = events.len(), "loaded candidate events");

        if events.len() < 2 {
            return Err(CoreError::Validation("fewer than 2 events to merge".to_string()).into());
        }
        let limit = self.config.merge.max_batch_size;
        if events.len() > limit {
            return Err(CoreError::Validation(format!(
                "event batch of {} exceeds the configured limit of {limit}",
                events.len()
            ))
            .into());
        }

        let active: Vec<Event> = events
            .into_iter()
            .filter(|e| e.status != EventStatus::Canceled)
            .collect();

        let groups = find_merge_groups(&active, user_id)?;
        debug!(user = %user_id, groups = groups.len(), "discovered merge groups");

        let group = select_group(&groups)
            .ok_or_else(|| CoreError::Validation("no overlapping events found".to_string()))?;
        let draft = synthesize(group)
            .ok_or_else(|| CoreError::Validation("no overlapping events found".to_string()))?;
        let merged_ids = draft.merged_from.clone();

        let (event, mut audit) = self.store.commit_merge(user_id, &merged_ids, draft)?;
        info!(
            user = %user_id,
            event = %event.id,
            merged = merged_ids.len(),
            "merged overlapping events"
        );

        if let Some(note) = self.dispatch_summary(&audit, group) {
            audit.notes = Some(note);
        }

        Ok(MergeOutcome { event, audit })
    }

    /// Dispatch summarization, preferring the asynchronous path. Returns
    /// the note written synchronously, if any.
    fn dispatch_summary(&self, audit: &AuditLog, group: &[Event]) -> Option<String> {
        if let Some(queue) = &self.queue {
            let job = SummaryJob::new(audit.id.clone(), audit.user_id.clone(), group);
            if queue.enqueue(job) {
                debug!(audit_log = %audit.id, "summary job enqueued");
                return None;
            }
            warn!(
                audit_log = %audit.id,
                "summary queue rejected job, falling back to synchronous path"
            );
        }

        let note = match &self.summarizer {
            Some(summarizer) => match summarizer.summarize(group) {
                Ok(text) => text,
                Err(error) => {
                    warn!(
                        audit_log = %audit.id,
                        error = %error,
                        "summarizer failed, using fallback note"
                    );
                    fallback_note(group.len())
                }
            },
            None => fallback_note(group.len()),
        };

        if let Err(error) = self.store.update_audit_notes(&audit.id, &note) {
            warn!(audit_log = %audit.id, error = %error, "failed to record summary note");
        }

        Some(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MergeSettings;
    use crate::memory::InMemoryBackend;
    use crate::store::{AuditSink, EventStore, StoreError, StoreResult};
    use crate::summarize::{run_summary_worker, ChannelQueue, SummarizeError};
    use calmerge_core::{EventDraft, NewAuditLog, Participant};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ts(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, min, 0).unwrap()
    }

    fn draft(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EventDraft {
        EventDraft::new(title, start, end, Participant::new("u1", "Alice"))
            .with_invitees([Participant::new("u2", "Bob")])
    }

    fn backend_with_user() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.register_user("u1");
        backend
    }

    fn orchestrator(backend: &Arc<InMemoryBackend>) -> MergeOrchestrator {
        MergeOrchestrator::new(backend.clone(), backend.clone())
    }

    fn validation_message(error: &EngineError) -> &str {
        match error {
            EngineError::Core(CoreError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    struct FixedSummarizer(&'static str);

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, _events: &[Event]) -> std::result::Result<String, SummarizeError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _events: &[Event]) -> std::result::Result<String, SummarizeError> {
            Err(SummarizeError("model unavailable".to_string()))
        }
    }

    #[test]
    fn test_unknown_user_fails_with_not_found() {
        let backend = backend_with_user();
        let error = orchestrator(&backend).merge_all("ghost").unwrap_err();

        assert!(matches!(error, EngineError::UserNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_fewer_than_two_events_is_rejected() {
        let backend = backend_with_user();
        backend
            .create_event(draft("Solo", ts(10, 0), ts(11, 0)))
            .unwrap();

        let error = orchestrator(&backend).merge_all("u1").unwrap_err();
        assert_eq!(validation_message(&error), "fewer than 2 events to merge");
    }

    #[test]
    fn test_canceled_events_do_not_count() {
        let backend = backend_with_user();
        backend
            .create_event(draft("Live", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(
                draft("Dead", ts(10, 30), ts(11, 30)).with_status(EventStatus::Canceled),
            )
            .unwrap();

        let error = orchestrator(&backend).merge_all("u1").unwrap_err();
        assert_eq!(
            validation_message(&error),
            "fewer than 2 active events to merge"
        );
    }

    #[test]
    fn test_no_overlapping_events_is_rejected() {
        let backend = backend_with_user();
        backend
            .create_event(draft("Morning", ts(8, 0), ts(9, 0)))
            .unwrap();
        backend
            .create_event(draft("Evening", ts(18, 0), ts(19, 0)))
            .unwrap();

        let error = orchestrator(&backend).merge_all("u1").unwrap_err();
        assert_eq!(validation_message(&error), "no overlapping events found");
    }

    #[test]
    fn test_batch_over_configured_ceiling_is_rejected() {
        let backend = backend_with_user();
        for i in 0..4u32 {
            backend
                .create_event(draft("Busy", ts(9 + i, 0), ts(10 + i, 30)))
                .unwrap();
        }

        let config = EngineConfig {
            merge: MergeSettings { max_batch_size: 3 },
            ..Default::default()
        };
        let error = orchestrator(&backend)
            .with_config(config)
            .merge_all("u1")
            .unwrap_err();

        assert_eq!(
            validation_message(&error),
            "event batch of 4 exceeds the configured limit of 3"
        );
    }

    #[test]
    fn test_two_event_merge_end_to_end() {
        let backend = backend_with_user();
        let e1 = backend
            .create_event(draft("Planning", ts(10, 0), ts(11, 0)))
            .unwrap();
        let e2 = backend
            .create_event(draft("Team Meeting", ts(10, 30), ts(11, 30)))
            .unwrap();

        let outcome = orchestrator(&backend).merge_all("u1").unwrap();

        assert_eq!(outcome.event.title, "Planning | Team Meeting");
        assert_eq!(outcome.event.start_time, ts(10, 0));
        assert_eq!(outcome.event.end_time, ts(11, 30));
        assert_eq!(outcome.event.creator.id, "u1");
        let invitee_ids: Vec<&str> =
            outcome.event.invitees.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(invitee_ids, vec!["u2"]);
        assert_eq!(
            outcome.event.merged_from,
            vec![e1.id.clone(), e2.id.clone()]
        );

        // The sources no longer exist in storage; only the product does.
        assert!(backend.get_event(&e1.id).is_none());
        assert!(backend.get_event(&e2.id).is_none());
        assert_eq!(backend.event_count(), 1);

        // Without any summarizer, the audit row carries the fallback note.
        assert_eq!(outcome.audit.merged_event_ids, vec![e1.id, e2.id]);
        assert_eq!(
            outcome.audit.notes,
            Some("Merged 2 overlapping events".to_string())
        );
        assert_eq!(
            backend.get_audit_log(&outcome.audit.id).unwrap().notes,
            outcome.audit.notes
        );
    }

    #[test]
    fn test_largest_group_wins_and_rest_stay_untouched() {
        let backend = backend_with_user();
        backend
            .create_event(draft("Pair A", ts(9, 0), ts(10, 0)))
            .unwrap();
        backend
            .create_event(draft("Pair B", ts(9, 30), ts(10, 30)))
            .unwrap();
        backend
            .create_event(draft("Trio A", ts(14, 0), ts(15, 0)))
            .unwrap();
        backend
            .create_event(draft("Trio B", ts(14, 30), ts(15, 30)))
            .unwrap();
        backend
            .create_event(draft("Trio C", ts(15, 0), ts(16, 0)))
            .unwrap();

        let outcome = orchestrator(&backend).merge_all("u1").unwrap();

        assert_eq!(outcome.event.merged_from.len(), 3);
        assert_eq!(outcome.event.title, "Trio A | Trio B | Trio C");
        assert_eq!(outcome.event.start_time, ts(14, 0));
        assert_eq!(outcome.event.end_time, ts(16, 0));
        // The pair survives alongside the merged trio.
        assert_eq!(backend.event_count(), 3);
    }

    #[test]
    fn test_merged_status_takes_highest_priority() {
        let backend = backend_with_user();
        backend
            .create_event(
                draft("First", ts(10, 0), ts(11, 0)).with_status(EventStatus::InProgress),
            )
            .unwrap();
        backend
            .create_event(
                draft("Second", ts(10, 30), ts(11, 30)).with_status(EventStatus::Completed),
            )
            .unwrap();

        let outcome = orchestrator(&backend).merge_all("u1").unwrap();
        assert_eq!(outcome.event.status, EventStatus::Completed);
    }

    #[test]
    fn test_incompatible_titles_block_the_merge() {
        let backend = backend_with_user();
        backend
            .create_event(draft("1:1 manager call", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(draft("demo meeting", ts(10, 0), ts(11, 0)))
            .unwrap();

        let error = orchestrator(&backend).merge_all("u1").unwrap_err();
        assert_eq!(validation_message(&error), "no overlapping events found");
        assert_eq!(backend.event_count(), 2);
    }

    #[test]
    fn test_only_invoker_in_common_blocks_the_merge() {
        let backend = backend_with_user();
        backend
            .create_event(
                EventDraft::new("A", ts(10, 0), ts(11, 0), Participant::new("u1", "Alice"))
                    .with_invitees([Participant::new("u2", "Bob")]),
            )
            .unwrap();
        backend
            .create_event(
                EventDraft::new("B", ts(10, 0), ts(11, 0), Participant::new("u1", "Alice"))
                    .with_invitees([Participant::new("u3", "Cara")]),
            )
            .unwrap();

        let error = orchestrator(&backend).merge_all("u1").unwrap_err();
        assert_eq!(validation_message(&error), "no overlapping events found");
    }

    #[test]
    fn test_synchronous_summarizer_writes_its_text() {
        let backend = backend_with_user();
        backend
            .create_event(draft("A", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(draft("B", ts(10, 30), ts(11, 30)))
            .unwrap();

        let outcome = orchestrator(&backend)
            .with_summarizer(Arc::new(FixedSummarizer("Busy morning consolidated")))
            .merge_all("u1")
            .unwrap();

        assert_eq!(
            outcome.audit.notes,
            Some("Busy morning consolidated".to_string())
        );
        assert_eq!(
            backend.get_audit_log(&outcome.audit.id).unwrap().notes,
            outcome.audit.notes
        );
    }

    #[test]
    fn test_failing_summarizer_degrades_to_fallback_note() {
        let backend = backend_with_user();
        backend
            .create_event(draft("A", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(draft("B", ts(10, 30), ts(11, 30)))
            .unwrap();

        let outcome = orchestrator(&backend)
            .with_summarizer(Arc::new(FailingSummarizer))
            .merge_all("u1")
            .unwrap();

        assert_eq!(
            outcome.audit.notes,
            Some("Merged 2 overlapping events".to_string())
        );
    }

    #[tokio::test]
    async fn test_accepted_queue_defers_notes_to_the_worker() {
        let backend = backend_with_user();
        backend
            .create_event(draft("A", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(draft("B", ts(10, 30), ts(11, 30)))
            .unwrap();

        let (queue, rx) = ChannelQueue::new(8);
        let orch = orchestrator(&backend)
            .with_queue(Arc::new(queue))
            .with_summarizer(Arc::new(FixedSummarizer("from the worker")));

        let outcome = orch.merge_all("u1").unwrap();

        // Async hand-off accepted: the merge response carries no notes yet.
        assert!(outcome.audit.notes.is_none());
        assert!(backend.get_audit_log(&outcome.audit.id).unwrap().notes.is_none());

        // Close the queue and let the worker drain the job.
        drop(orch);
        run_summary_worker(
            rx,
            Arc::new(FixedSummarizer("from the worker")),
            backend.clone(),
        )
        .await;

        assert_eq!(
            backend.get_audit_log(&outcome.audit.id).unwrap().notes,
            Some("from the worker".to_string())
        );
    }

    #[test]
    fn test_rejected_queue_falls_back_to_synchronous_path() {
        let backend = backend_with_user();
        backend
            .create_event(draft("A", ts(10, 0), ts(11, 0)))
            .unwrap();
        backend
            .create_event(draft("B", ts(10, 30), ts(11, 30)))
            .unwrap();

        // Fill the single-slot queue so the merge's enqueue is rejected.
        let (queue, _rx) = ChannelQueue::new(1);
        assert!(queue.enqueue(SummaryJob::new("aud_primed", "u1", &[])));

        let outcome = orchestrator(&backend)
            .with_queue(Arc::new(queue))
            .with_summarizer(Arc::new(FixedSummarizer("sync fallback")))
            .merge_all("u1")
            .unwrap();

        assert_eq!(outcome.audit.notes, Some("sync fallback".to_string()));
    }

    struct BrokenStore;

    impl EventStore for BrokenStore {
        fn load_events_involving(&self, _user_id: &str) -> StoreResult<Vec<Event>> {
            Ok(vec![
                Event::new("evt_1", "A", ts(10, 0), ts(11, 0), Participant::new("u1", "Alice"))
                    .with_invitees([Participant::new("u2", "Bob")]),
                Event::new("evt_2", "B", ts(10, 30), ts(11, 30), Participant::new("u1", "Alice"))
                    .with_invitees([Participant::new("u2", "Bob")]),
            ])
        }

        fn insert_event(&self, _draft: EventDraft) -> StoreResult<Event> {
            Err(StoreError::TransactionAborted("write refused".to_string()))
        }

        fn delete_events(&self, _ids: &[String]) -> StoreResult<()> {
            Err(StoreError::TransactionAborted("write refused".to_string()))
        }
    }

    impl AuditSink for BrokenStore {
        fn create_audit_log(&self, _new: NewAuditLog) -> StoreResult<AuditLog> {
            Err(StoreError::TransactionAborted("write refused".to_string()))
        }

        fn update_audit_notes(&self, _id: &str, _notes: &str) -> StoreResult<()> {
            Err(StoreError::TransactionAborted("write refused".to_string()))
        }
    }

    impl MergeStore for BrokenStore {
        fn commit_merge(
            &self,
            _user_id: &str,
            _merged_ids: &[String],
            _draft: EventDraft,
        ) -> StoreResult<(Event, AuditLog)> {
            Err(StoreError::TransactionAborted("commit failed".to_string()))
        }
    }

    struct OpenDirectory;

    impl crate::store::UserDirectory for OpenDirectory {
        fn user_exists(&self, _user_id: &str) -> StoreResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_commit_failure_propagates_as_persistence_error() {
        let orch = MergeOrchestrator::new(Arc::new(BrokenStore), Arc::new(OpenDirectory));
        let error = orch.merge_all("u1").unwrap_err();

        assert!(matches!(
            error,
            EngineError::Persistence(StoreError::TransactionAborted(message))
                if message == "commit failed"
        ));
    }
}
