//! Participant model.

use serde::{Deserialize, Serialize};

/// A user appearing on an event as creator or invitee.
///
/// Identity is carried by `id` alone; `name` and `email` are display
/// attributes and never participate in set membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Opaque unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Contact email (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Participant {
    /// Create a new participant with the minimal required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    /// Add an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Check whether this participant carries the given id.
    #[must_use]
    pub fn is(&self, id: &str) -> bool {
        self.id == id
    }
}
