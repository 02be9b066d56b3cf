//! Composer modes and the static mode menu table

use serde::{Deserialize, Serialize};

/// How the current draft is packaged for submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerMode {
    /// Plain text post
    #[default]
    Plaintext,
    /// Markdown post
    Markdown,
    /// Media post (attachments, optional caption)
    Media,
    /// Reply to an existing message
    Reply,
    /// Reroute (repost) of an existing message, optional comment
    Reroute,
}

/// One row of the mode menu table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    /// The mode
    pub mode: ComposerMode,
    /// Whether the user can pick it from the mode menu
    pub selectable: bool,
}

/// The mode menu. Reply and reroute need a fixed target and are only
/// reachable by external binding.
pub const MODE_TABLE: &[ModeEntry] = &[
    ModeEntry {
        mode: ComposerMode::Plaintext,
        selectable: true,
    },
    ModeEntry {
        mode: ComposerMode::Markdown,
        selectable: true,
    },
    ModeEntry {
        mode: ComposerMode::Media,
        selectable: true,
    },
    ModeEntry {
        mode: ComposerMode::Reply,
        selectable: false,
    },
    ModeEntry {
        mode: ComposerMode::Reroute,
        selectable: false,
    },
];

impl ComposerMode {
    /// Get all modes
    pub const fn all() -> &'static [Self] {
        &[
            Self::Plaintext,
            Self::Markdown,
            Self::Media,
            Self::Reply,
            Self::Reroute,
        ]
    }

    /// Modes offered in the mode menu
    pub fn selectable_modes() -> impl Iterator<Item = Self> {
        MODE_TABLE
            .iter()
            .filter(|entry| entry.selectable)
            .map(|entry| entry.mode)
    }

    /// Whether the user may select this mode from the menu
    pub fn is_selectable(self) -> bool {
        MODE_TABLE
            .iter()
            .any(|entry| entry.mode == self && entry.selectable)
    }

    /// Whether this mode needs a bound target message
    pub const fn requires_target(self) -> bool {
        matches!(self, Self::Reply | Self::Reroute)
    }

    /// Whether a blank body is acceptable in this mode
    pub const fn allows_empty_body(self) -> bool {
        matches!(self, Self::Media | Self::Reroute)
    }

    /// Get the display name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plaintext => "Plaintext",
            Self::Markdown => "Markdown",
            Self::Media => "Media",
            Self::Reply => "Reply",
            Self::Reroute => "Reroute",
        }
    }
}

impl std::fmt::Display for ComposerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The message a reply or reroute points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    /// Target message identifier
    #[serde(rename = "messageID")]
    pub message_id: String,
    /// Author of the target message
    #[serde(rename = "messageAuthor")]
    pub author: String,
}

impl TargetRef {
    /// Create a new target reference
    pub fn new(message_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            author: author.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_excludes_targeted_modes() {
        let menu: Vec<_> = ComposerMode::selectable_modes().collect();
        assert_eq!(
            menu,
            vec![
                ComposerMode::Plaintext,
                ComposerMode::Markdown,
                ComposerMode::Media
            ]
        );
        assert!(!ComposerMode::Reply.is_selectable());
        assert!(!ComposerMode::Reroute.is_selectable());
    }

    #[test]
    fn test_mode_table_covers_every_mode() {
        for mode in ComposerMode::all() {
            assert!(MODE_TABLE.iter().any(|e| e.mode == *mode));
        }
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(ComposerMode::Markdown.to_string(), "Markdown");
        assert_eq!(ComposerMode::Reroute.name(), "Reroute");
    }
}
