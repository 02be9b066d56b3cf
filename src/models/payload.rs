//! The payload handed to the transport on submit

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EmojiDictionary, MediaAttachment, TargetRef};

/// Everything a transport operation needs to publish one draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    /// Final draft body
    pub body: String,
    /// Deduplicated destination timeline IDs
    pub destinations: BTreeSet<String>,
    /// Emojis referenced by the body (superset)
    pub emojis: EmojiDictionary,
    /// `@token` matches found in the body, taken literally
    pub mentions: Vec<String>,
    /// Restricted recipient IDs
    pub whisper: Vec<String>,
    /// Alternate persona for this post
    #[serde(rename = "profileOverrideID", default, skip_serializing_if = "Option::is_none")]
    pub profile_override_id: Option<String>,
    /// Attachments (media mode only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaAttachment>,
    /// Target message (reply and reroute only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
}

impl SubmissionPayload {
    /// Destinations as a vector, in sorted order
    pub fn destination_list(&self) -> Vec<String> {
        self.destinations.iter().cloned().collect()
    }
}
