//! Calendar event model.

use crate::error::{CoreError, Result};
use crate::participant::Participant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle status of an event.
///
/// Ordered by merge priority: a merged event adopts the status of its
/// highest-priority member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not started.
    Todo,
    /// Currently running or being worked.
    InProgress,
    /// Finished.
    Completed,
    /// Called off; never eligible for merging.
    Canceled,
}

impl EventStatus {
    /// Merge priority: COMPLETED(4) > IN_PROGRESS(3) > TODO(2) > CANCELED(1).
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Completed => 4,
            Self::InProgress => 3,
            Self::Todo => 2,
            Self::Canceled => 1,
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "TODO"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// A calendar event with a creator and a set of invitees.
///
/// The participant set is always the creator plus the invitees, as a
/// disjoint union; the creator never appears among the invitees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Unique identifier (e.g., "evt_6f1a..."), immutable once assigned.
    pub id: String,

    /// Human-readable title; may be empty.
    pub title: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status.
    pub status: EventStatus,

    /// Start instant; always before `end_time` for validated events.
    pub start_time: DateTime<Utc>,

    /// End instant.
    pub end_time: DateTime<Utc>,

    /// The participant who created the event.
    pub creator: Participant,

    /// Invited participants, unique by id, excluding the creator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invitees: Vec<Participant>,

    /// Source event ids when this event is the product of a merge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<String>,

    /// Creation timestamp (informational only).
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (informational only).
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event with minimal required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        creator: Participant,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: EventStatus::Todo,
            start_time,
            end_time,
            creator,
            invitees: Vec::new(),
            merged_from: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the invitee list.
    #[must_use]
    pub fn with_invitees(mut self, invitees: impl IntoIterator<Item = Participant>) -> Self {
        self.invitees = invitees.into_iter().collect();
        self
    }

    /// Iterate the full participant set: creator first, then invitees.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.creator).chain(self.invitees.iter())
    }

    /// Check whether the given user is the creator or an invitee.
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        self.participants().any(|p| p.is(user_id))
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Apply a partial update, re-validating the prospective time range and
    /// invitee set before committing any change.
    ///
    /// # Errors
    /// Returns a validation error and leaves the event untouched if the
    /// patched fields would violate the creation invariants.
    pub fn apply_patch(&mut self, patch: EventPatch) -> Result<()> {
        let start_time = patch.start_time.unwrap_or(self.start_time);
        let end_time = patch.end_time.unwrap_or(self.end_time);
        validate_time_range(start_time, end_time)?;
        if let Some(invitees) = &patch.invitees {
            validate_invitees(&self.creator.id, invitees)?;
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(invitees) = patch.invitees {
            self.invitees = invitees;
        }
        self.start_time = start_time;
        self.end_time = end_time;
        self.touch();

        Ok(())
    }
}

/// An event that has not been persisted yet: no id, no timestamps.
///
/// Drafts come from two places: validated caller input (`validate` enforces
/// the creation invariants) and the merge synthesizer (whose output is
/// persisted as-is, without re-validation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDraft {
    /// Title; may be empty.
    pub title: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Status.
    pub status: EventStatus,

    /// Start instant.
    pub start_time: DateTime<Utc>,

    /// End instant.
    pub end_time: DateTime<Utc>,

    /// Creating participant.
    pub creator: Participant,

    /// Invited participants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invitees: Vec<Participant>,

    /// Source event ids when the draft is a merge product.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<String>,
}

impl EventDraft {
    /// Create a new draft with minimal required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        creator: Participant,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: EventStatus::Todo,
            start_time,
            end_time,
            creator,
            invitees: Vec::new(),
            merged_from: Vec::new(),
        }
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the invitee list.
    #[must_use]
    pub fn with_invitees(mut self, invitees: impl IntoIterator<Item = Participant>) -> Self {
        self.invitees = invitees.into_iter().collect();
        self
    }

    /// Check the creation invariants: `start_time < end_time`, creator not
    /// among the invitees, invitee ids unique.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        validate_time_range(self.start_time, self.end_time)?;
        validate_invitees(&self.creator.id, &self.invitees)
    }

    /// Materialize the draft as a stored event with a store-assigned id.
    #[must_use]
    pub fn into_event(self, id: impl Into<String>, now: DateTime<Utc>) -> Event {
        Event {
            id: id.into(),
            title: self.title,
            description: self.description,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            creator: self.creator,
            invitees: self.invitees,
            merged_from: self.merged_from,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an event; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,

    /// New start instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// New end instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Replacement invitee list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitees: Option<Vec<Participant>>,
}

fn validate_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(CoreError::InvalidTimeRange { start, end });
    }
    Ok(())
}

fn validate_invitees(creator_id: &str, invitees: &[Participant]) -> Result<()> {
    let mut seen = HashSet::new();
    for invitee in invitees {
        if invitee.id == creator_id {
            return Err(CoreError::CreatorIsInvitee(invitee.id.clone()));
        }
        if !seen.insert(invitee.id.as_str()) {
            return Err(CoreError::DuplicateInvitee(invitee.id.clone()));
        }
    }
    Ok(())
}
