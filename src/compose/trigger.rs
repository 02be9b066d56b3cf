//! Inline autocomplete trigger detection.
//!
//! A trigger is a `:word` or `@token` run that ends exactly at the cursor.
//! Emoji triggers take priority over mention triggers, so at most one is
//! active at a time.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::floor_char_boundary;

static EMOJI_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\w+)$").expect("valid emoji trigger pattern"));

static MENTION_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\S+)$").expect("valid mention trigger pattern"));

/// What kind of suggestion a trigger asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// `:shortcode` query
    Emoji,
    /// `@username` query
    Mention,
}

impl TriggerKind {
    /// The character that opens this trigger
    pub const fn sigil(self) -> char {
        match self {
            Self::Emoji => ':',
            Self::Mention => '@',
        }
    }
}

/// The active inline token before the cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Nothing to complete
    #[default]
    None,
    /// An active query
    Active {
        /// Trigger kind
        kind: TriggerKind,
        /// Text between the trigger character and the cursor
        query: String,
        /// Byte offset of the trigger character
        start: usize,
    },
}

impl Trigger {
    /// Whether a trigger is active
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Active kind, if any
    pub const fn kind(&self) -> Option<TriggerKind> {
        match self {
            Self::Active { kind, .. } => Some(*kind),
            Self::None => None,
        }
    }

    /// Active query, if any
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::Active { query, .. } => Some(query),
            Self::None => None,
        }
    }
}

/// Classify the token that ends at `cursor` (a byte offset into `text`)
pub fn detect(text: &str, cursor: usize) -> Trigger {
    let before = &text[..floor_char_boundary(text, cursor)];

    for (kind, pattern) in [
        (TriggerKind::Emoji, &*EMOJI_TRIGGER),
        (TriggerKind::Mention, &*MENTION_TRIGGER),
    ] {
        if let Some(caps) = pattern.captures(before)
            && let (Some(whole), Some(query)) = (caps.get(0), caps.get(1))
        {
            return Trigger::Active {
                kind,
                query: query.as_str().to_string(),
                start: whole.start(),
            };
        }
    }

    Trigger::None
}
