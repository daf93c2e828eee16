//! calmerge-core: Domain models and merge algorithms for overlapping
//! calendar events.
//!
//! This crate provides:
//! - `Event`, `Participant`, `AuditLog`: the core domain model
//! - `may_merge`: the pairwise overlap predicate (time, participants, titles)
//! - `find_merge_groups` / `select_group`: connected-component grouping
//! - `synthesize`: computing the single consolidated event for a group

pub mod audit;
pub mod error;
pub mod event;
pub mod group;
pub mod merge;
pub mod overlap;
pub mod participant;
pub mod titles;

pub use audit::{AuditLog, NewAuditLog};
pub use error::{CoreError, Result};
pub use event::{Event, EventDraft, EventPatch, EventStatus};
pub use group::{find_merge_groups, select_group};
pub use merge::synthesize;
pub use overlap::{may_merge, share_participant_besides, times_overlap};
pub use participant::Participant;
pub use titles::titles_compatible;
