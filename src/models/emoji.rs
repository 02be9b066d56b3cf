//! Emoji references, packages and the per-draft emoji dictionary

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A custom emoji that can be embedded as `:shortcode:`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiRef {
    /// Shortcode without surrounding colons
    pub shortcode: String,
    /// Static image URL
    #[serde(rename = "imageURL")]
    pub image_url: String,
    /// Animated image URL, if the emoji has one
    #[serde(rename = "animURL", default, skip_serializing_if = "Option::is_none")]
    pub anim_url: Option<String>,
}

impl EmojiRef {
    /// Create a static emoji reference
    pub fn new(shortcode: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            shortcode: shortcode.into(),
            image_url: image_url.into(),
            anim_url: None,
        }
    }

    /// Attach an animated variant
    pub fn with_anim(mut self, anim_url: impl Into<String>) -> Self {
        self.anim_url = Some(anim_url.into());
        self
    }

    /// The literal text form, e.g. `:blobcat:`
    pub fn literal(&self) -> String {
        format!(":{}:", self.shortcode)
    }
}

/// An emoji inside a package, with optional search aliases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEmoji {
    /// The emoji itself
    #[serde(flatten)]
    pub emoji: EmojiRef,
    /// Extra names the emoji can be found by
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl From<EmojiRef> for PackageEmoji {
    fn from(emoji: EmojiRef) -> Self {
        Self {
            emoji,
            aliases: Vec::new(),
        }
    }
}

/// A named emoji package as published by an emoji index source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiPackage {
    /// Package name
    pub name: String,
    /// Package icon URL
    #[serde(rename = "iconURL")]
    pub icon_url: String,
    /// Emojis in this package
    pub emojis: Vec<PackageEmoji>,
}

/// Accumulated map from shortcode to emoji reference for one draft.
///
/// Grows on every insert/confirm and is never pruned when the shortcode is
/// later deleted from the text. It is a superset cache that travels with the
/// post at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmojiDictionary {
    entries: HashMap<String, EmojiRef>,
}

impl EmojiDictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or refresh) an emoji
    pub fn insert(&mut self, emoji: EmojiRef) {
        self.entries.insert(emoji.shortcode.clone(), emoji);
    }

    /// Look up a shortcode
    pub fn get(&self, shortcode: &str) -> Option<&EmojiRef> {
        self.entries.get(shortcode)
    }

    /// Check whether a shortcode is known
    pub fn contains(&self, shortcode: &str) -> bool {
        self.entries.contains_key(shortcode)
    }

    /// Number of known shortcodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry (only done after a successful submit)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &EmojiRef> {
        self.entries.values()
    }
}

impl FromIterator<EmojiRef> for EmojiDictionary {
    fn from_iter<T: IntoIterator<Item = EmojiRef>>(iter: T) -> Self {
        let mut dict = Self::new();
        for emoji in iter {
            dict.insert(emoji);
        }
        dict
    }
}
