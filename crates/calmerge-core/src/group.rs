//! Merge-group discovery and selection.
//!
//! Groups are connected components of the pairwise `may_merge` relation:
//! if A may merge with B and B with C, all three form one group even when A
//! and C fail the pairwise test on their own.

use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::overlap::may_merge;
use chrono::{DateTime, Utc};

/// Partition the candidate events into merge groups of size >= 2.
///
/// The input must already have canceled events excluded. Components are
/// grown by iterative fixed-point expansion over a processed-flag array
/// rather than a materialized adjacency structure; per-user candidate sets
/// are small enough that repeated scans stay cheap.
///
/// Group order follows the seed order of the input, which keeps selection
/// deterministic for a fixed input order.
///
/// # Errors
/// Returns a validation error when fewer than 2 candidates remain, or when
/// no component of size >= 2 exists.
pub fn find_merge_groups(events: &[Event], user_id: &str) -> Result<Vec<Vec<Event>>> {
    if events.len() < 2 {
        return Err(CoreError::Validation(
            "fewer than 2 active events to merge".to_string(),
        ));
    }

    let mut processed = vec![false; events.len()];
    let mut groups = Vec::new();

    for seed in 0..events.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;
        let mut members = vec![seed];

        // Fixed-point expansion: keep sweeping until a full pass adds nothing.
        loop {
            let mut grew = false;
            for candidate in 0..events.len() {
                if processed[candidate] {
                    continue;
                }
                let connected = members
                    .iter()
                    .any(|&member| may_merge(&events[member], &events[candidate], user_id));
                if connected {
                    processed[candidate] = true;
                    members.push(candidate);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        if members.len() >= 2 {
            groups.push(members.iter().map(|&i| events[i].clone()).collect());
        }
    }

    if groups.is_empty() {
        return Err(CoreError::Validation(
            "no overlapping events found".to_string(),
        ));
    }

    Ok(groups)
}

/// Pick the group to merge: maximum member count, ties broken by earlier
/// minimum start time, then by first-encountered order.
#[must_use]
pub fn select_group(groups: &[Vec<Event>]) -> Option<&[Event]> {
    let mut best: Option<&[Event]> = None;
    for group in groups {
        let group = group.as_slice();
        match best {
            None => best = Some(group),
            Some(current) => {
                let larger = group.len() > current.len();
                let earlier_tie =
                    group.len() == current.len() && min_start(group) < min_start(current);
                if larger || earlier_tie {
                    best = Some(group);
                }
            }
        }
    }
    best
}

fn min_start(group: &[Event]) -> DateTime<Utc> {
    group
        .iter()
        .map(|e| e.start_time)
        .min()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
