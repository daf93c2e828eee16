//! Merge synthesis: computing the single consolidated event for a group.

use crate::event::{Event, EventDraft, EventStatus};
use std::collections::HashSet;

/// Synthesize one event draft from a merge group.
///
/// Members are sorted by start time (stable, input order on ties) and the
/// draft's fields are computed from that order:
/// - `title`: member titles joined with `" | "`, empty segments preserved
/// - `description`: non-blank descriptions joined with a blank line
/// - `status`: highest merge priority, first member wins ties
/// - `start_time`/`end_time`: envelope of the group
/// - `creator`: creator of the earliest-starting member
/// - `invitees`: id-deduplicated union of every member's participants,
///   minus the chosen creator
/// - `merged_from`: member ids in ascending-start order
///
/// The draft is persisted as-is; merge output is not re-validated against
/// the creation invariants.
///
/// Returns `None` for an empty group.
#[must_use]
pub fn synthesize(group: &[Event]) -> Option<EventDraft> {
    let mut sorted: Vec<&Event> = group.iter().collect();
    sorted.sort_by_key(|e| e.start_time);
    let first = *sorted.first()?;

    let title = sorted
        .iter()
        .map(|e| e.title.as_str())
        .collect::<Vec<_>>()
        .join(" | ");

    let descriptions: Vec<&str> = sorted
        .iter()
        .filter_map(|e| e.description.as_deref())
        .filter(|d| !d.trim().is_empty())
        .collect();
    let description = if descriptions.is_empty() {
        None
    } else {
        Some(descriptions.join("\n\n"))
    };

    // Ties keep the first member in sorted order; max_by_key would keep the last.
    let status = sorted
        .iter()
        .map(|e| e.status)
        .reduce(|best, candidate| {
            if candidate.priority() > best.priority() {
                candidate
            } else {
                best
            }
        })
        .unwrap_or(EventStatus::Todo);

    let end_time = sorted.iter().map(|e| e.end_time).max()?;

    let creator = first.creator.clone();
    let mut seen: HashSet<String> = HashSet::new();
    let mut invitees = Vec::new();
    for event in &sorted {
        for participant in event.participants() {
            if participant.id != creator.id && seen.insert(participant.id.clone()) {
                invitees.push(participant.clone());
            }
        }
    }

    let merged_from = sorted.iter().map(|e| e.id.clone()).collect();

    Some(EventDraft {
        title,
        description,
        status,
        start_time: first.start_time,
        end_time,
        creator,
        invitees,
        merged_from,
    })
}
