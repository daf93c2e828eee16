//! Pairwise merge predicate.
//!
//! Two events may merge when their time ranges overlap (inclusive), they
//! share a participant besides the invoking user, and their titles are
//! compatible. Status is not consulted here; canceled events are excluded
//! upstream, before grouping.

use crate::event::Event;
use crate::titles::titles_compatible;
use std::collections::HashSet;

/// Inclusive interval intersection test.
///
/// Touching boundaries count as overlapping, so back-to-back meetings
/// (one event's end equals the other's start) qualify.
#[must_use]
pub fn times_overlap(a: &Event, b: &Event) -> bool {
    a.start_time <= b.end_time && a.end_time >= b.start_time
}

/// Test whether two events share a participant other than the invoking user.
///
/// The invoking user is the common thread across the candidate set and is
/// removed from both participant sets before the intersection test.
#[must_use]
pub fn share_participant_besides(a: &Event, b: &Event, user_id: &str) -> bool {
    let others: HashSet<&str> = b
        .participants()
        .map(|p| p.id.as_str())
        .filter(|id| *id != user_id)
        .collect();

    a.participants()
        .map(|p| p.id.as_str())
        .filter(|id| *id != user_id)
        .any(|id| others.contains(id))
}

/// The combined pairwise decision: time overlap, shared participant besides
/// the invoking user, and title compatibility.
#[must_use]
pub fn may_merge(a: &Event, b: &Event, user_id: &str) -> bool {
    times_overlap(a, b)
        && share_participant_besides(a, b, user_id)
        && titles_compatible(&a.title, &b.title)
}
