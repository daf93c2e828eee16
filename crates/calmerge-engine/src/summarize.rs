//! Summarization contracts and the asynchronous dispatch path.
//!
//! The orchestrator prefers handing summary work to a queue; when no queue
//! is wired in or the queue rejects the job, it calls a synchronous
//! summarizer; when that fails too (or none exists), a deterministic
//! fallback note is written. Summarization never fails a merge.

use crate::store::AuditSink;
use calmerge_core::Event;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Error from a summarizer implementation.
///
/// Never propagated past the merge engine; it only selects the fallback
/// note.
#[derive(Debug, Error)]
#[error("summarization failed: {0}")]
pub struct SummarizeError(pub String);

/// Synchronous summary generation over a merged group.
pub trait Summarizer: Send + Sync {
    /// Produce summary text for the given events.
    ///
    /// # Errors
    /// Implementations apply their own timeout/retry policy and surface
    /// whatever remains as a `SummarizeError`.
    fn summarize(&self, events: &[Event]) -> std::result::Result<String, SummarizeError>;
}

/// Asynchronous hand-off for summary generation.
pub trait SummaryQueue: Send + Sync {
    /// Offer a job to the queue, returning whether it was accepted.
    fn enqueue(&self, job: SummaryJob) -> bool;
}

/// Self-contained summary work order.
///
/// Carries full event snapshots: the source events are deleted by the time
/// a worker runs, so the job must not require re-querying the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryJob {
    /// Audit row to attach the summary to.
    pub audit_log_id: String,

    /// The user whose events were merged.
    pub user_id: String,

    /// Snapshots of the merged source events.
    pub events: Vec<Event>,
}

impl SummaryJob {
    /// Snapshot a merged group into a work order.
    #[must_use]
    pub fn new(
        audit_log_id: impl Into<String>,
        user_id: impl Into<String>,
        events: &[Event],
    ) -> Self {
        Self {
            audit_log_id: audit_log_id.into(),
            user_id: user_id.into(),
            events: events.to_vec(),
        }
    }
}

/// The note written when no summarizer produced text.
#[must_use]
pub fn fallback_note(count: usize) -> String {
    format!("Merged {count} overlapping events")
}

/// Bounded channel-backed summary queue.
pub struct ChannelQueue {
    tx: mpsc::Sender<SummaryJob>,
}

impl ChannelQueue {
    /// Create a queue with the given capacity, returning the receiver for a
    /// worker to drain.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SummaryJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl SummaryQueue for ChannelQueue {
    fn enqueue(&self, job: SummaryJob) -> bool {
        self.tx.try_send(job).is_ok()
    }
}

/// Drain summary jobs until the queue closes.
///
/// Summarizer failures degrade to the fallback note and audit update
/// failures are logged and swallowed, so every received job leaves its
/// audit row with a note.
pub async fn run_summary_worker(
    mut rx: mpsc::Receiver<SummaryJob>,
    summarizer: Arc<dyn Summarizer>,
    audit: Arc<dyn AuditSink>,
) {
    while let Some(job) = rx.recv().await {
        let note = match summarizer.summarize(&job.events) {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    audit_log = %job.audit_log_id,
                    error = %error,
                    "summarizer failed, using fallback note"
                );
                fallback_note(job.events.len())
            }
        };
        match audit.update_audit_notes(&job.audit_log_id, &note) {
            Ok(()) => debug!(audit_log = %job.audit_log_id, "attached summary note"),
            Err(error) => {
                warn!(
                    audit_log = %job.audit_log_id,
                    error = %error,
                    "failed to attach summary note"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::store::AuditSink;
    use calmerge_core::{NewAuditLog, Participant};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _events: &[Event]) -> Result<String, SummarizeError> {
            Err(SummarizeError("model unavailable".to_string()))
        }
    }

    fn sample_events() -> Vec<Event> {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 2, 11, 0, 0).unwrap();
        vec![
            Event::new("evt_1", "Planning", start, end, Participant::new("u1", "Alice")),
            Event::new("evt_2", "Sync", start, end, Participant::new("u1", "Alice")),
        ]
    }

    #[test]
    fn test_fallback_note_format() {
        assert_eq!(fallback_note(3), "Merged 3 overlapping events");
    }

    #[test]
    fn test_channel_queue_accepts_until_full() {
        let (queue, _rx) = ChannelQueue::new(1);
        let job = SummaryJob::new("aud_1", "u1", &sample_events());

        assert!(queue.enqueue(job.clone()));
        assert!(!queue.enqueue(job));
    }

    #[test]
    fn test_channel_queue_rejects_after_receiver_dropped() {
        let (queue, rx) = ChannelQueue::new(4);
        drop(rx);

        let job = SummaryJob::new("aud_1", "u1", &sample_events());
        assert!(!queue.enqueue(job));
    }

    #[test]
    fn test_summary_job_round_trips_through_json() {
        let job = SummaryJob::new("aud_1", "u1", &sample_events());
        let json = serde_json::to_string(&job).unwrap();
        let back: SummaryJob = serde_json::from_str(&json).unwrap();

        assert_eq!(back, job);
    }

    #[tokio::test]
    async fn test_worker_writes_fallback_on_summarizer_failure() {
        let backend = Arc::new(InMemoryBackend::new());
        let log = backend
            .create_audit_log(NewAuditLog::new(
                "u1",
                "evt_9",
                vec!["evt_1".into(), "evt_2".into()],
            ))
            .unwrap();

        let (queue, rx) = ChannelQueue::new(4);
        assert!(queue.enqueue(SummaryJob::new(log.id.clone(), "u1", &sample_events())));
        drop(queue);

        run_summary_worker(rx, Arc::new(FailingSummarizer), backend.clone()).await;

        assert_eq!(
            backend.get_audit_log(&log.id).unwrap().notes,
            Some("Merged 2 overlapping events".to_string())
        );
    }
}
