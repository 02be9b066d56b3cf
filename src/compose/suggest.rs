//! Ranked autocomplete candidates for emoji and mention triggers.
//!
//! Each candidate kind has its own prebuilt index. Indices are immutable
//! snapshots behind an `Arc`; a source change replaces the snapshot instead
//! of mutating it, so a query never re-scans the raw source.

use std::sync::Arc;

use crate::api::{ContactDirectory, EmojiIndexSource};
use crate::config::SuggestionConfig;
use crate::models::{Contact, EmojiPackage, EmojiRef};

use super::trigger::TriggerKind;

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    /// An emoji to insert as `:shortcode:`
    Emoji(EmojiRef),
    /// A contact to insert as `@id`
    Contact(Contact),
}

impl Suggestion {
    /// Text shown in the suggestion list
    pub fn label(&self) -> &str {
        match self {
            Self::Emoji(e) => &e.shortcode,
            Self::Contact(c) => &c.username,
        }
    }
}

#[derive(Debug, Clone)]
struct EmojiEntry {
    emoji: EmojiRef,
    /// Lowercased shortcode followed by lowercased aliases
    keys: Vec<String>,
}

/// Searchable snapshot of every emoji across all packages
#[derive(Debug, Clone, Default)]
pub struct EmojiIndex {
    entries: Vec<EmojiEntry>,
}

impl EmojiIndex {
    /// Build the index in one pass over all packages.
    ///
    /// A shortcode that appears in several packages is indexed once; the
    /// first package wins.
    pub fn build(packages: &[EmojiPackage]) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::new();

        for package in packages {
            for item in &package.emojis {
                if !seen.insert(item.emoji.shortcode.clone()) {
                    continue;
                }
                let mut keys = Vec::with_capacity(1 + item.aliases.len());
                keys.push(item.emoji.shortcode.to_lowercase());
                keys.extend(item.aliases.iter().map(|a| a.to_lowercase()));
                entries.push(EmojiEntry {
                    emoji: item.emoji.clone(),
                    keys,
                });
            }
        }

        Self { entries }
    }

    /// Number of indexed emojis
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact shortcode lookup
    pub fn get(&self, shortcode: &str) -> Option<&EmojiRef> {
        self.entries
            .iter()
            .find(|e| e.emoji.shortcode == shortcode)
            .map(|e| &e.emoji)
    }

    /// Ranked emojis for a query, best first
    pub fn search(&self, query: &str, limit: usize, threshold: f64) -> Vec<EmojiRef> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(i64, &EmojiEntry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .keys
                    .iter()
                    .filter_map(|key| emoji_score(&needle, key, threshold))
                    .max()
                    .map(|score| (score, entry))
            })
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then_with(|| a.emoji.shortcode.cmp(&b.emoji.shortcode))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.emoji.clone())
            .collect()
    }
}

/// Score one key against a lowercased needle, `None` when it does not match
fn emoji_score(needle: &str, key: &str, threshold: f64) -> Option<i64> {
    if key == needle {
        return Some(1_000_000);
    }

    let key_len = key.chars().count() as i64;
    if key.starts_with(needle) {
        return Some(500_000 - key_len);
    }

    if let Some(first) = key.find(needle) {
        let boundary = key[..first].ends_with(['_', '-']);
        let bonus = if boundary { 20_000 } else { 0 };
        return Some(200_000 + bonus - (first as i64) * 1000 - key_len);
    }

    // Typo tolerant match, bounded by the similarity threshold
    let ratio = rapidfuzz::fuzz::ratio(needle.chars(), key.chars());
    if ratio < threshold {
        return None;
    }

    let mut score = (ratio * 1000.0).round() as i64;
    if is_subsequence(needle, key) {
        score += 500;
    }
    Some(score)
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|want| hay.any(|ch| ch == want))
}

/// Searchable snapshot of the contact directory
#[derive(Debug, Clone, Default)]
pub struct ContactIndex {
    entries: Vec<(String, Contact)>,
}

impl ContactIndex {
    /// Build the index in one pass
    pub fn build(contacts: &[Contact]) -> Self {
        Self {
            entries: contacts
                .iter()
                .map(|c| (c.username.to_lowercase(), c.clone()))
                .collect(),
        }
    }

    /// Number of indexed contacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring match over usernames, prefix matches first
    pub fn search(&self, query: &str, limit: usize) -> Vec<Contact> {
        let needle = query.trim().to_lowercase();

        let mut matched: Vec<(usize, &String, &Contact)> = self
            .entries
            .iter()
            .filter_map(|(key, contact)| key.find(&needle).map(|pos| (pos, key, contact)))
            .collect();

        matched.sort_by(|(pos_a, key_a, _), (pos_b, key_b, _)| {
            pos_a.cmp(pos_b).then_with(|| key_a.cmp(key_b))
        });

        matched
            .into_iter()
            .take(limit)
            .map(|(_, _, contact)| contact.clone())
            .collect()
    }
}

/// Ranks candidates for the active trigger
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    emojis: Arc<EmojiIndex>,
    contacts: Arc<ContactIndex>,
    emoji_revision: Option<u64>,
    contact_revision: Option<u64>,
    limit: usize,
    threshold: f64,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(&SuggestionConfig::default())
    }
}

impl SuggestionEngine {
    /// Create an engine with empty indices
    pub fn new(config: &SuggestionConfig) -> Self {
        Self {
            emojis: Arc::new(EmojiIndex::default()),
            contacts: Arc::new(ContactIndex::default()),
            emoji_revision: None,
            contact_revision: None,
            limit: config.limit.max(1),
            threshold: config.fuzzy_threshold.clamp(0.0, 1.0),
        }
    }

    /// Replace the emoji snapshot
    pub fn rebuild_emojis(&mut self, packages: &[EmojiPackage]) {
        self.emojis = Arc::new(EmojiIndex::build(packages));
        tracing::debug!("Emoji index rebuilt: {} entries", self.emojis.len());
    }

    /// Replace the contact snapshot
    pub fn rebuild_contacts(&mut self, contacts: &[Contact]) {
        self.contacts = Arc::new(ContactIndex::build(contacts));
        tracing::debug!("Contact index rebuilt: {} entries", self.contacts.len());
    }

    /// Rebuild the emoji index if the source changed since the last sync.
    ///
    /// Returns whether a rebuild happened.
    pub fn sync_emojis(&mut self, source: &impl EmojiIndexSource) -> bool {
        let revision = source.revision();
        if self.emoji_revision == Some(revision) {
            return false;
        }
        self.rebuild_emojis(&source.packages());
        self.emoji_revision = Some(revision);
        true
    }

    /// Rebuild the contact index if the directory changed since the last sync
    pub fn sync_contacts(&mut self, directory: &impl ContactDirectory) -> bool {
        let revision = directory.revision();
        if self.contact_revision == Some(revision) {
            return false;
        }
        self.rebuild_contacts(&directory.contacts());
        self.contact_revision = Some(revision);
        true
    }

    /// Current emoji snapshot
    pub fn emoji_index(&self) -> Arc<EmojiIndex> {
        Arc::clone(&self.emojis)
    }

    /// Current contact snapshot
    pub fn contact_index(&self) -> Arc<ContactIndex> {
        Arc::clone(&self.contacts)
    }

    /// Ranked candidates for a trigger query
    pub fn query(&self, kind: TriggerKind, query: &str) -> Vec<Suggestion> {
        match kind {
            TriggerKind::Emoji => self
                .emojis
                .search(query, self.limit, self.threshold)
                .into_iter()
                .map(Suggestion::Emoji)
                .collect(),
            TriggerKind::Mention => self
                .contacts
                .search(query, self.limit)
                .into_iter()
                .map(Suggestion::Contact)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ContactList, EmojiCatalog};
    use crate::models::PackageEmoji;

    fn package() -> EmojiPackage {
        let emoji = |code: &str| PackageEmoji::from(EmojiRef::new(code, format!("https://e.example/{code}.png")));
        let mut smile = emoji("smile");
        smile.aliases.push("happy".to_string());
        EmojiPackage {
            name: "basic".to_string(),
            icon_url: "https://e.example/icon.png".to_string(),
            emojis: vec![
                emoji("blobcat"),
                emoji("blobcat_heart"),
                emoji("blob"),
                emoji("neocat"),
                smile,
            ],
        }
    }

    fn codes(results: &[Suggestion]) -> Vec<&str> {
        results.iter().map(Suggestion::label).collect()
    }

    fn engine() -> SuggestionEngine {
        let mut engine = SuggestionEngine::default();
        engine.rebuild_emojis(&[package()]);
        engine
    }

    #[test]
    fn test_exact_then_prefix_then_substring() {
        let results = engine().query(TriggerKind::Emoji, "blob");
        assert_eq!(codes(&results), vec!["blob", "blobcat", "blobcat_heart"]);

        let results = engine().query(TriggerKind::Emoji, "cat");
        assert_eq!(codes(&results)[..2], ["neocat", "blobcat"]);
    }

    #[test]
    fn test_alias_match() {
        let results = engine().query(TriggerKind::Emoji, "happ");
        assert_eq!(codes(&results), vec!["smile"]);
    }

    #[test]
    fn test_typo_tolerance_is_threshold_bounded() {
        let results = engine().query(TriggerKind::Emoji, "blbcat");
        assert_eq!(codes(&results).first(), Some(&"blobcat"));

        let results = engine().query(TriggerKind::Emoji, "zzzz");
        assert!(results.is_empty());
    }

    #[test]
    fn test_limit_applies() {
        let mut engine = SuggestionEngine::new(&SuggestionConfig {
            limit: 1,
            fuzzy_threshold: 0.6,
        });
        engine.rebuild_emojis(&[package()]);
        assert_eq!(engine.query(TriggerKind::Emoji, "blob").len(), 1);
    }

    #[test]
    fn test_duplicate_shortcodes_indexed_once() {
        let index = EmojiIndex::build(&[package(), package()]);
        assert_eq!(index.len(), 5);
        assert!(index.get("neocat").is_some());
    }

    #[test]
    fn test_contact_substring_case_insensitive() {
        let mut engine = SuggestionEngine::default();
        engine.rebuild_contacts(&[
            Contact::new("CC1", "Alice"),
            Contact::new("CC2", "malice"),
            Contact::new("CC3", "bob"),
        ]);

        let results = engine.query(TriggerKind::Mention, "ALI");
        assert_eq!(codes(&results), vec!["Alice", "malice"]);
        assert!(engine.query(TriggerKind::Mention, "zed").is_empty());
    }

    #[test]
    fn test_sync_rebuilds_only_on_revision_change() {
        let mut catalog = EmojiCatalog::new(vec![package()]);
        let mut engine = SuggestionEngine::default();
        let before = engine.emoji_index();

        assert!(engine.sync_emojis(&catalog));
        assert!(!engine.sync_emojis(&catalog));
        // Old snapshot is untouched by the rebuild
        assert!(before.is_empty());
        assert_eq!(engine.emoji_index().len(), 5);

        catalog.replace(Vec::new());
        assert!(engine.sync_emojis(&catalog));
        assert!(engine.emoji_index().is_empty());

        let contacts = ContactList::new(vec![Contact::new("CC1", "alice")]);
        assert!(engine.sync_contacts(&contacts));
        assert!(!engine.sync_contacts(&contacts));
        assert_eq!(engine.contact_index().len(), 1);
    }
}
