//! calmerge-engine: Merge orchestration over narrow collaborator contracts.
//!
//! This crate provides:
//! - The collaborator traits: `EventStore`, `UserDirectory`, `AuditSink`,
//!   `MergeStore`, `Summarizer`, `SummaryQueue`
//! - `MergeOrchestrator`: the validate → group → synthesize → commit →
//!   summarize sequence and its failure taxonomy
//! - `InMemoryBackend`: a reference backend for tests and embedding
//! - The bounded summary queue and its background worker

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod orchestrator;
pub mod store;
pub mod summarize;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use memory::InMemoryBackend;
pub use orchestrator::{MergeOrchestrator, MergeOutcome};
pub use store::{AuditSink, EventStore, MergeStore, StoreError, StoreResult, UserDirectory};
pub use summarize::{
    fallback_note, run_summary_worker, ChannelQueue, SummarizeError, Summarizer, SummaryJob,
    SummaryQueue,
};
