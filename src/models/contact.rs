//! Contacts (mention candidates) and resolved identities

use serde::{Deserialize, Serialize};

/// A mention candidate from the contact directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque entity identifier, inserted verbatim on mention confirm
    pub id: String,
    /// Human-facing username, used for matching
    pub username: String,
}

impl Contact {
    /// Create a new contact
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// Display identity returned by an identity resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display username
    pub username: String,
    /// Avatar URL
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}
