//! Composer session state
//!
//! One [`Composer`] owns the draft, the emoji dictionary, the attachment
//! list and the mode. Every mutation goes through `&mut self`, including
//! the async upload and submit flows, so there is never more than one
//! operation touching the draft at a time.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ContactDirectory, EmojiIndexSource, MediaStore, Transport};
use crate::config::Config;
use crate::error::{ComposerError, UploadError};
use crate::models::{
    ComposerMode, Draft, EmojiDictionary, EmojiRef, MediaAttachment, MediaFile, MediaPatch,
    SubmissionPayload, TargetRef,
};
use crate::store::{PersistentStore, Preferences};

use super::attachments::{self, MediaAttachmentList};
use super::blurhash::BlurPreviewer;
use super::overlay::{KeyOutcome, OverlayKey, Presentation, SuggestionOverlay};
use super::submit;
use super::suggest::{Suggestion, SuggestionEngine};
use super::trigger::{self, Trigger};

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation, e.g. after a successful post
    Info,
    /// Something the user has to act on
    Error,
}

/// Transient user feedback (validation, upload and post failures)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Human-readable text
    pub message: String,
}

impl Notice {
    /// Informational notice
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A single message composer
pub struct Composer {
    /// Draft text and cursor
    draft: Draft,
    /// Emojis referenced so far; never pruned on text deletion
    emojis: EmojiDictionary,
    /// Uploaded media (media mode)
    attachments: MediaAttachmentList,

    /// Current packaging mode
    mode: ComposerMode,
    /// Set once a mode was bound externally; menu selection is then ignored
    mode_locked: bool,
    /// Message being replied to or rerouted
    target: Option<TargetRef>,

    /// Explicitly selected timelines
    destinations: BTreeSet<String>,
    /// The user's home timeline
    home_timeline: Option<String>,
    /// Whether to also post to home
    post_home: bool,
    /// Restricted recipients
    whisper: Vec<String>,
    /// Alternate persona
    profile_override: Option<String>,

    engine: SuggestionEngine,
    overlay: SuggestionOverlay,
    previewer: BlurPreviewer,
    store: Arc<dyn PersistentStore>,

    /// Last feedback message
    notice: Option<Notice>,
    /// Is a submission awaiting the transport?
    submitting: bool,
    on_complete: Option<Box<dyn FnMut() + Send>>,
}

impl Composer {
    /// Create an empty composer
    pub fn new(config: &Config, store: Arc<dyn PersistentStore>) -> Self {
        let mode = if config.composer.default_mode.is_selectable() {
            config.composer.default_mode
        } else {
            tracing::warn!(
                "Default mode {} is not selectable, using {}",
                config.composer.default_mode,
                ComposerMode::Plaintext
            );
            ComposerMode::Plaintext
        };

        Self {
            draft: Draft::default(),
            emojis: EmojiDictionary::new(),
            attachments: MediaAttachmentList::new(),
            mode,
            mode_locked: false,
            target: None,
            destinations: BTreeSet::new(),
            home_timeline: None,
            post_home: config.composer.post_home_by_default,
            whisper: Vec::new(),
            profile_override: None,
            engine: SuggestionEngine::new(&config.suggestions),
            overlay: SuggestionOverlay::new(
                Presentation::default(),
                config.composer.overlay_grace(),
            ),
            previewer: BlurPreviewer::from_config(&config.media),
            store,
            notice: None,
            submitting: false,
            on_complete: None,
        }
    }

    /// Use a different suggestion presentation
    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.overlay = SuggestionOverlay::new(presentation, self.overlay.grace());
        self
    }

    /// Callback invoked after every successful submit
    pub fn on_complete(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    // --- accessors ---

    /// Draft text and cursor
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Draft text
    pub fn text(&self) -> &str {
        &self.draft.text
    }

    /// Cursor byte offset
    pub fn cursor(&self) -> usize {
        self.draft.cursor
    }

    /// Emojis confirmed or picked during this session
    pub fn emojis(&self) -> &EmojiDictionary {
        &self.emojis
    }

    /// Pending media attachments
    pub fn attachments(&self) -> &MediaAttachmentList {
        &self.attachments
    }

    /// Current mode
    pub fn mode(&self) -> ComposerMode {
        self.mode
    }

    /// Whether the mode was bound from outside
    pub fn is_mode_locked(&self) -> bool {
        self.mode_locked
    }

    /// Bound reply or reroute target
    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    /// Suggestion list state
    pub fn overlay(&self) -> &SuggestionOverlay {
        &self.overlay
    }

    /// Active trigger at the cursor
    pub fn trigger(&self) -> &Trigger {
        self.overlay.trigger()
    }

    /// Latest notice, if any
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Take the notice, clearing it
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Whether a submit is awaiting the transport
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // --- modes ---

    /// Bind a mode from outside (e.g. "reply to message X").
    ///
    /// The binding wins over, and locks out, any later menu selection.
    pub fn bind_mode(&mut self, mode: ComposerMode, target: Option<TargetRef>) {
        self.transition(mode);
        self.target = target;
        self.mode_locked = true;
    }

    /// Mode menu selection. Returns whether the mode changed.
    pub fn select_mode(&mut self, mode: ComposerMode) -> bool {
        if self.mode_locked {
            tracing::debug!("Ignoring mode selection {mode}: mode is bound");
            return false;
        }
        if !mode.is_selectable() {
            tracing::debug!("Ignoring mode selection {mode}: not selectable");
            return false;
        }
        if mode == self.mode {
            return false;
        }
        self.transition(mode);
        true
    }

    fn transition(&mut self, next: ComposerMode) {
        if self.mode == ComposerMode::Media && next != ComposerMode::Media {
            for attachment in self.attachments.drain() {
                if next == ComposerMode::Plaintext {
                    continue;
                }
                if let Some(literal) = attachment.inline_literal() {
                    self.draft.append_line(&literal);
                }
            }
            self.refresh_trigger();
        }

        tracing::debug!("Composer mode {} -> {}", self.mode, next);
        self.mode = next;
    }

    // --- destinations ---

    /// Replace the explicitly selected timelines
    pub fn set_destinations<I, S>(&mut self, destinations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destinations = destinations.into_iter().map(Into::into).collect();
    }

    /// Toggle one timeline in the selection
    pub fn toggle_destination(&mut self, id: &str) {
        if !self.destinations.remove(id) {
            self.destinations.insert(id.to_string());
        }
    }

    /// Home timeline added when "also post to home" is on
    pub fn set_home_timeline(&mut self, id: Option<String>) {
        self.home_timeline = id;
    }

    /// Switch "also post to home"
    pub fn set_post_home(&mut self, on: bool) {
        self.post_home = on;
    }

    /// Whether "also post to home" is on
    pub fn post_home(&self) -> bool {
        self.post_home
    }

    /// Restrict the post to these recipients
    pub fn set_whisper(&mut self, participants: Vec<String>) {
        self.whisper = participants;
    }

    /// Post under an alternate persona
    pub fn set_profile_override(&mut self, id: Option<String>) {
        self.profile_override = id;
    }

    // --- editing ---

    /// Replace the whole text; the cursor moves to the end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft = Draft::new(text);
        self.refresh_trigger();
    }

    /// Type text at the cursor
    pub fn insert_text(&mut self, text: &str) {
        self.draft.insert(text);
        self.refresh_trigger();
    }

    /// Delete the char before the cursor
    pub fn backspace(&mut self) {
        self.draft.backspace();
        self.refresh_trigger();
    }

    /// Move the cursor to a byte offset
    pub fn move_cursor(&mut self, cursor: usize) {
        self.draft.set_cursor(cursor);
        self.refresh_trigger();
    }

    /// The input gained focus
    pub fn focus(&mut self) {
        self.overlay.focus();
    }

    /// The input lost focus at `now`
    pub fn blur(&mut self, now: Instant) {
        self.overlay.blur(now);
    }

    /// Advance overlay timers
    pub fn tick(&mut self, now: Instant) {
        self.overlay.tick(now);
    }

    /// Re-run trigger detection and candidate ranking
    fn refresh_trigger(&mut self) {
        let trigger = trigger::detect(&self.draft.text, self.draft.cursor);
        let candidates = match &trigger {
            Trigger::Active { kind, query, .. } => self.engine.query(*kind, query),
            Trigger::None => Vec::new(),
        };
        self.overlay.update(trigger, candidates);
    }

    // --- suggestions ---

    /// Pick up emoji package changes
    pub fn sync_emojis(&mut self, source: &impl EmojiIndexSource) {
        if self.engine.sync_emojis(source) {
            self.refresh_trigger();
        }
    }

    /// Pick up contact list changes
    pub fn sync_contacts(&mut self, directory: &impl ContactDirectory) {
        if self.engine.sync_contacts(directory) {
            self.refresh_trigger();
        }
    }

    /// Feed a navigation key to the suggestion list
    pub fn handle_key(&mut self, key: OverlayKey) -> KeyOutcome {
        let outcome = self.overlay.handle_key(key);
        if let KeyOutcome::Confirm(suggestion) = &outcome {
            self.confirm(suggestion.clone());
        }
        outcome
    }

    /// Pointer click on a suggestion row
    pub fn pick_suggestion(&mut self, index: usize) -> bool {
        match self.overlay.pick(index) {
            Some(suggestion) => {
                self.confirm(suggestion);
                true
            }
            None => false,
        }
    }

    /// Splice the candidate over the trigger span, plus one trailing space
    fn confirm(&mut self, suggestion: Suggestion) {
        let Trigger::Active { kind, start, .. } = *self.overlay.trigger() else {
            return;
        };
        // Splice from the last sigil, so `@bob@al` keeps `@bob`
        let cursor = self.draft.cursor;
        let start = self
            .draft
            .text
            .get(start..cursor)
            .and_then(|span| span.rfind(kind.sigil()))
            .map_or(start, |offset| start + offset);

        let replacement = match suggestion {
            Suggestion::Emoji(emoji) => {
                let literal = emoji.literal();
                self.remember_emoji(emoji);
                literal
            }
            Suggestion::Contact(contact) => format!("@{}", contact.id),
        };

        self.draft.splice(start..cursor, &format!("{replacement} "));
        self.overlay.close();
        self.refresh_trigger();
    }

    /// Insert an emoji chosen from the picker at the cursor
    pub fn insert_emoji(&mut self, emoji: EmojiRef) {
        self.draft.insert(&format!("{} ", emoji.literal()));
        self.remember_emoji(emoji);
        self.refresh_trigger();
    }

    fn remember_emoji(&mut self, emoji: EmojiRef) {
        if let Err(e) = Preferences::new(self.store.as_ref()).record_emoji_use(&emoji) {
            tracing::warn!("Failed to record emoji use: {e:#}");
        }
        self.emojis.insert(emoji);
    }

    /// Most used emojis, for the picker
    pub fn frequent_emojis(&self) -> Vec<EmojiRef> {
        match Preferences::new(self.store.as_ref()).frequent_emojis() {
            Ok(frequent) => frequent.into_iter().map(|f| f.emoji).collect(),
            Err(e) => {
                tracing::warn!("Failed to read frequent emojis: {e:#}");
                Vec::new()
            }
        }
    }

    // --- attachments ---

    /// Upload files: attached in media mode, pasted inline otherwise
    pub async fn add_files(
        &mut self,
        files: &[MediaFile],
        store: &impl MediaStore,
    ) -> Vec<UploadError> {
        let errors = if self.mode == ComposerMode::Media {
            attachments::attach_files(&mut self.attachments, files, store, self.previewer).await
        } else {
            let errors = attachments::paste_files(&mut self.draft, files, store).await;
            self.refresh_trigger();
            errors
        };

        if let Some(last) = errors.last() {
            self.notice = Some(Notice::error(last.to_string()));
        }
        errors
    }

    /// Add an already uploaded attachment
    pub fn push_attachment(&mut self, attachment: MediaAttachment) {
        self.attachments.append(attachment);
    }

    /// Remove an attachment by position
    pub fn remove_attachment(&mut self, index: usize) -> Option<MediaAttachment> {
        self.attachments.remove_at(index)
    }

    /// Update an attachment in place; false when out of range
    pub fn patch_attachment(&mut self, index: usize, patch: MediaPatch) -> bool {
        self.attachments.patch_at(index, patch)
    }

    // --- submit ---

    /// Snapshot the composer into a payload
    pub fn payload(&self) -> SubmissionPayload {
        let body = self.draft.text.clone();
        SubmissionPayload {
            mentions: submit::extract_mentions(&body),
            body,
            destinations: submit::compute_destinations(
                &self.destinations,
                self.home_timeline.as_deref(),
                self.post_home,
            ),
            emojis: self.emojis.clone(),
            whisper: self.whisper.clone(),
            profile_override_id: self.profile_override.clone(),
            media: if self.mode == ComposerMode::Media {
                self.attachments.as_slice().to_vec()
            } else {
                Vec::new()
            },
            target: if self.mode.requires_target() {
                self.target.clone()
            } else {
                None
            },
        }
    }

    /// Validate and send the draft.
    ///
    /// On success the draft, emoji dictionary and attachments are cleared and
    /// the completion callback runs. On any failure everything is kept.
    pub async fn submit(&mut self, transport: &impl Transport) -> Result<(), ComposerError> {
        if let Err(e) = submit::validate(
            self.mode,
            &self.draft.text,
            &self.attachments,
            self.target.as_ref(),
        ) {
            tracing::debug!("Submit rejected: {e}");
            self.notice = Some(Notice::error(e.to_string()));
            return Err(e.into());
        }

        let payload = self.payload();
        self.submitting = true;
        let result = submit::dispatch(transport, self.mode, &payload).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                tracing::info!(
                    "Posted {} message to {} destination(s)",
                    self.mode,
                    payload.destinations.len()
                );
                self.draft.clear();
                self.emojis.clear();
                self.attachments.clear();
                self.overlay.close();
                self.notice = Some(Notice::info("Posted"));
                if let Some(callback) = self.on_complete.as_mut() {
                    callback();
                }
                Ok(())
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!("Post failed: {message}");
                self.notice = Some(Notice::error(message.clone()));
                Err(ComposerError::Submission(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ContactList, EmojiCatalog};
    use crate::models::{Contact, EmojiPackage, PackageEmoji};
    use crate::store::MemoryStore;

    fn composer() -> Composer {
        let mut composer = Composer::new(&Config::default(), Arc::new(MemoryStore::new()));
        composer.focus();
        composer
    }

    fn catalog() -> EmojiCatalog {
        EmojiCatalog::new(vec![EmojiPackage {
            name: "blobs".to_string(),
            icon_url: String::new(),
            emojis: vec![PackageEmoji::from(EmojiRef::new(
                "blobcat",
                "https://e.example/blobcat.png",
            ))],
        }])
    }

    #[test]
    fn test_emoji_confirm_splices_and_remembers() {
        let mut composer = composer();
        composer.sync_emojis(&catalog());
        composer.set_text("hi :blobc tail");
        composer.move_cursor("hi :blobc".len());
        assert!(composer.overlay().is_visible());

        assert!(matches!(
            composer.handle_key(OverlayKey::Enter),
            KeyOutcome::Confirm(_)
        ));
        assert_eq!(composer.text(), "hi :blobcat:  tail");
        assert_eq!(composer.cursor(), "hi :blobcat: ".len());
        assert!(!composer.overlay().is_visible());
        assert_eq!(composer.overlay().selected_index(), 0);

        // Removing the text does not prune the dictionary
        composer.set_text("");
        assert_eq!(
            composer.emojis().get("blobcat").map(|e| e.image_url.as_str()),
            Some("https://e.example/blobcat.png")
        );
        assert_eq!(composer.frequent_emojis()[0].shortcode, "blobcat");
    }

    #[test]
    fn test_mention_confirm_uses_contact_id() {
        let mut composer = composer();
        composer.sync_contacts(&ContactList::new(vec![Contact::new("CC42", "alice")]));
        composer.set_text("ping @ali");
        assert!(composer.pick_suggestion(0));
        assert_eq!(composer.text(), "ping @CC42 ");
        assert_eq!(composer.payload().mentions, ["CC42"]);
    }

    #[test]
    fn test_confirm_splices_from_last_sigil() {
        let mut composer = composer();
        composer.sync_contacts(&ContactList::new(vec![Contact::new("CC9", "bob@alpha")]));
        composer.set_text("hey @bob@al");
        assert!(composer.pick_suggestion(0));
        assert_eq!(composer.text(), "hey @bob@CC9 ");
        assert_eq!(composer.cursor(), composer.text().len());
    }

    #[test]
    fn test_bind_mode_locks_selection() {
        let mut composer = composer();
        composer.bind_mode(
            ComposerMode::Reply,
            Some(TargetRef::new("msg1", "author")),
        );
        assert!(!composer.select_mode(ComposerMode::Markdown));
        assert_eq!(composer.mode(), ComposerMode::Reply);
        assert!(composer.is_mode_locked());
    }

    #[test]
    fn test_menu_rejects_unselectable_modes() {
        let mut composer = composer();
        assert!(!composer.select_mode(ComposerMode::Reroute));
        assert!(composer.select_mode(ComposerMode::Markdown));
        assert_eq!(composer.mode(), ComposerMode::Markdown);
    }

    #[test]
    fn test_leaving_media_for_plaintext_drops_literals() {
        let mut composer = composer();
        composer.select_mode(ComposerMode::Media);
        composer.set_text("caption");
        composer.push_attachment(MediaAttachment::new("A", "image/png"));

        composer.select_mode(ComposerMode::Plaintext);
        assert_eq!(composer.text(), "caption");
        assert!(composer.attachments().is_empty());
    }

    #[test]
    fn test_other_transitions_leave_draft_alone() {
        let mut composer = composer();
        composer.set_text("keep me");
        composer.select_mode(ComposerMode::Markdown);
        composer.select_mode(ComposerMode::Media);
        composer.select_mode(ComposerMode::Plaintext);
        assert_eq!(composer.text(), "keep me");
    }

    #[test]
    fn test_insert_emoji_from_picker() {
        let mut composer = composer();
        composer.set_text("nice ");
        composer.insert_emoji(EmojiRef::new("party", "https://e.example/party.png"));
        assert_eq!(composer.text(), "nice :party: ");
        assert!(composer.emojis().contains("party"));
    }

    #[test]
    fn test_payload_fields() {
        let mut composer = composer();
        composer.set_destinations(["T1", "T2"]);
        composer.set_home_timeline(Some("T1".to_string()));
        composer.set_post_home(true);
        composer.set_whisper(vec!["P1".to_string()]);
        composer.set_profile_override(Some("persona".to_string()));
        composer.set_text("hello @T9");

        let payload = composer.payload();
        assert_eq!(payload.destination_list(), ["T1", "T2"]);
        assert_eq!(payload.whisper, ["P1"]);
        assert_eq!(payload.profile_override_id.as_deref(), Some("persona"));
        assert_eq!(payload.mentions, ["T9"]);
        assert!(payload.target.is_none());
    }
}
