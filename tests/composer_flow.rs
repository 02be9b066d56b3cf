//! End-to-end composer behaviour through the public API

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quill::api::{ContactList, EmojiCatalog, MediaStore, PostOptions, Transport};
use quill::compose::{OverlayKey, TriggerKind};
use quill::markup::{self, plain_text};
use quill::models::{Contact, EmojiPackage, PackageEmoji};
use quill::{
    Composer, ComposerError, ComposerMode, Config, EmojiDictionary, EmojiRef, MediaAttachment,
    MediaFile, MemoryStore, NoticeLevel, TargetRef, ValidationError, View,
};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    op: &'static str,
    body: String,
    destinations: Vec<String>,
    mentions: Vec<String>,
    media: usize,
}

/// Transport that records every call and optionally fails
#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    fail_with: Option<String>,
}

impl RecordingTransport {
    fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    fn record(
        &self,
        op: &'static str,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call {
            op,
            body: body.to_string(),
            destinations: destinations.to_vec(),
            mentions: options.mentions.to_vec(),
            media: options.media.len(),
        });
        match &self.fail_with {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn plaintext(
        &self,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.record("plaintext", body, destinations, options)
    }

    async fn markdown(
        &self,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.record("markdown", body, destinations, options)
    }

    async fn media(
        &self,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.record("media", body, destinations, options)
    }

    async fn reply(
        &self,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.record("reply", body, destinations, options)
    }

    async fn reroute(
        &self,
        body: &str,
        destinations: &[String],
        options: PostOptions<'_>,
    ) -> anyhow::Result<()> {
        self.record("reroute", body, destinations, options)
    }
}

/// Media store handing out sequential URLs
#[derive(Default)]
struct CountingStore {
    uploads: AtomicUsize,
}

impl MediaStore for CountingStore {
    async fn upload(&self, file: &MediaFile) -> Option<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Some(format!("https://media.example/{n}/{}", file.name))
    }
}

fn composer() -> Composer {
    let mut composer = Composer::new(&Config::default(), Arc::new(MemoryStore::new()));
    composer.focus();
    composer
}

fn emoji_catalog() -> EmojiCatalog {
    EmojiCatalog::new(vec![EmojiPackage {
        name: "blobs".to_string(),
        icon_url: String::new(),
        emojis: vec![
            PackageEmoji::from(EmojiRef::new("blobcat", "https://e.example/blobcat.png")),
            PackageEmoji::from(EmojiRef::new("blobfox", "https://e.example/blobfox.png")),
        ],
    }])
}

#[test]
fn test_at_most_one_trigger_active() {
    let mut composer = composer();

    composer.set_text("hello :blo");
    assert_eq!(composer.trigger().kind(), Some(TriggerKind::Emoji));
    assert_eq!(composer.trigger().query(), Some("blo"));

    composer.set_text("hi @ali");
    assert_eq!(composer.trigger().kind(), Some(TriggerKind::Mention));

    // Both sigils in one token: the emoji trigger wins
    composer.set_text("@x:blo");
    assert_eq!(composer.trigger().kind(), Some(TriggerKind::Emoji));

    composer.set_text("nothing here ");
    assert!(!composer.trigger().is_active());
}

#[test]
fn test_emoji_confirm_splices_trigger_span() {
    let mut composer = composer();
    composer.sync_emojis(&emoji_catalog());

    composer.set_text("so :blobc rest");
    composer.move_cursor("so :blobc".len());
    assert!(composer.overlay().is_visible());
    composer.handle_key(OverlayKey::Enter);

    assert_eq!(composer.text(), "so :blobcat:  rest");
    assert_eq!(composer.cursor(), "so :blobcat: ".len());
    assert!(composer.emojis().contains("blobcat"));
    assert!(!composer.trigger().is_active());
}

#[test]
fn test_mention_confirm_inserts_contact_id() {
    let mut composer = composer();
    composer.sync_contacts(&ContactList::new(vec![Contact::new("CC7f3a", "alice")]));

    composer.set_text("ping @ali");
    assert!(composer.pick_suggestion(0));
    assert_eq!(composer.text(), "ping @CC7f3a ");
    assert_eq!(composer.payload().mentions, vec!["CC7f3a".to_string()]);
}

#[test]
fn test_emoji_kept_after_literal_deleted() {
    let mut composer = composer();
    composer.sync_emojis(&emoji_catalog());

    composer.set_text(":blobf");
    composer.handle_key(OverlayKey::Enter);
    assert_eq!(composer.text(), ":blobfox: ");

    while !composer.text().is_empty() {
        composer.backspace();
    }
    composer.insert_text("plain words");

    let payload = composer.payload();
    assert!(payload.emojis.contains("blobfox"));
    assert!(!payload.body.contains(":blobfox:"));
}

#[test]
fn test_media_to_markdown_appends_literals_in_order() {
    let mut composer = composer();
    assert!(composer.select_mode(ComposerMode::Media));
    composer.push_attachment(MediaAttachment::new("A", "image/png"));
    composer.push_attachment(MediaAttachment::new("B", "video/mp4"));

    assert!(composer.select_mode(ComposerMode::Markdown));
    assert_eq!(
        composer.text(),
        "![image](A)\n<video controls src=\"B\"></video>"
    );
    assert!(composer.attachments().is_empty());
}

#[test]
fn test_media_to_plaintext_discards_attachments() {
    let mut composer = composer();
    composer.select_mode(ComposerMode::Media);
    composer.set_text("caption");
    composer.push_attachment(MediaAttachment::new("A", "image/png"));

    composer.select_mode(ComposerMode::Plaintext);
    assert_eq!(composer.text(), "caption");
    assert!(composer.attachments().is_empty());
}

#[tokio::test]
async fn test_blank_markdown_rejected_without_changes() {
    let mut composer = composer();
    composer.select_mode(ComposerMode::Markdown);
    composer.set_text("   \n\t");
    let transport = RecordingTransport::default();

    let result = composer.submit(&transport).await;
    assert!(matches!(
        result,
        Err(ComposerError::Validation(ValidationError::EmptyBody))
    ));
    assert_eq!(composer.text(), "   \n\t");
    assert!(transport.calls().is_empty());
    assert_eq!(composer.notice().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn test_media_without_attachments_rejected() {
    let mut composer = composer();
    composer.select_mode(ComposerMode::Media);
    composer.set_text("caption only");
    let transport = RecordingTransport::default();

    let result = composer.submit(&transport).await;
    assert!(matches!(
        result,
        Err(ComposerError::Validation(ValidationError::NoAttachments))
    ));
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_media_upload_then_submit() {
    let mut composer = composer();
    composer.select_mode(ComposerMode::Media);
    composer.set_home_timeline(Some("home".to_string()));
    let store = CountingStore::default();

    let errors = composer
        .add_files(&[MediaFile::new("clip.mp4", "video/mp4", vec![0; 16])], &store)
        .await;
    assert!(errors.is_empty());
    assert_eq!(composer.attachments().len(), 1);
    assert_eq!(
        composer.attachments().get(0).map(|a| a.url.as_str()),
        Some("https://media.example/0/clip.mp4")
    );

    let transport = RecordingTransport::default();
    composer.submit(&transport).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].op, "media");
    assert_eq!(calls[0].media, 1);
    assert_eq!(calls[0].body, "");
    assert!(composer.attachments().is_empty());
}

#[tokio::test]
async fn test_paste_outside_media_mode_goes_inline() {
    let mut composer = composer();
    composer.set_text("look: ");
    let store = CountingStore::default();

    composer
        .add_files(&[MediaFile::new("cat.png", "image/png", vec![1, 2, 3])], &store)
        .await;

    assert_eq!(
        composer.text(),
        "look: ![image](https://media.example/0/cat.png)"
    );
    assert!(composer.attachments().is_empty());
}

#[test]
fn test_unknown_emoji_renders_literally() {
    let emojis = EmojiDictionary::new();
    let first = markup::render("hi :unknown:", &emojis);
    let second = markup::render("hi :unknown:", &emojis);

    assert_eq!(first, second);
    assert_eq!(plain_text(&first), "hi :unknown:");
}

#[test]
fn test_script_stripped_video_controls_kept() {
    let views = markup::render(
        r#"<script>alert(1)</script><video controls src="x"></video>"#,
        &EmojiDictionary::new(),
    );

    fn find_video(views: &[View]) -> Option<&View> {
        views.iter().find_map(|v| match v {
            View::Video { .. } => Some(v),
            View::Paragraph(children) => find_video(children),
            _ => None,
        })
    }

    assert!(!plain_text(&views).contains("alert"));
    assert!(matches!(
        find_video(&views),
        Some(View::Video { src, controls: true, .. }) if src == "x"
    ));
}

#[tokio::test]
async fn test_home_timeline_added_to_destinations() {
    let mut composer = composer();
    composer.set_destinations(["T1"]);
    composer.set_home_timeline(Some("T2".to_string()));
    composer.set_post_home(true);
    composer.set_text("hello @someone");

    let transport = RecordingTransport::default();
    composer.submit(&transport).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].op, "plaintext");
    assert_eq!(calls[0].destinations, vec!["T1".to_string(), "T2".to_string()]);
    assert_eq!(calls[0].mentions, vec!["someone".to_string()]);
}

#[test]
fn test_home_toggle_off_keeps_selection() {
    let mut composer = composer();
    composer.set_destinations(["T1", "T1"]);
    composer.set_home_timeline(Some("T2".to_string()));
    composer.set_post_home(false);

    let payload = composer.payload();
    assert_eq!(payload.destination_list(), vec!["T1".to_string()]);
}

#[tokio::test]
async fn test_transport_failure_keeps_state() {
    let mut composer = composer();
    composer.sync_emojis(&emoji_catalog());
    composer.select_mode(ComposerMode::Markdown);
    composer.set_text(":blobc");
    composer.handle_key(OverlayKey::Enter);
    composer.insert_text("**hi**");

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    composer.on_complete(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let transport = RecordingTransport::failing("timeline is read-only");
    let result = composer.submit(&transport).await;

    assert!(matches!(result, Err(ComposerError::Submission(ref m)) if m.contains("read-only")));
    assert_eq!(composer.text(), ":blobcat: **hi**");
    assert!(composer.emojis().contains("blobcat"));
    assert!(!composer.is_submitting());
    assert_eq!(completed.load(Ordering::SeqCst), 0);

    let notice = composer.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("read-only"));
}

#[tokio::test]
async fn test_success_clears_and_notifies_once() {
    let mut composer = composer();
    composer.sync_emojis(&emoji_catalog());
    composer.set_text(":blobc");
    composer.handle_key(OverlayKey::Enter);

    let completed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completed);
    composer.on_complete(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let transport = RecordingTransport::default();
    composer.submit(&transport).await.unwrap();

    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert_eq!(composer.text(), "");
    assert!(composer.emojis().is_empty());
    assert_eq!(composer.notice().map(|n| n.level), Some(NoticeLevel::Info));
}

#[tokio::test]
async fn test_bound_reply_carries_target() {
    let mut composer = composer();
    composer.bind_mode(
        ComposerMode::Reply,
        Some(TargetRef::new("msg-1", "CCauthor")),
    );
    assert!(!composer.select_mode(ComposerMode::Markdown));
    composer.set_text("agreed");

    let transport = RecordingTransport::default();
    composer.submit(&transport).await.unwrap();
    assert_eq!(transport.calls()[0].op, "reply");
}

#[tokio::test]
async fn test_reply_without_target_rejected() {
    let mut composer = composer();
    composer.bind_mode(ComposerMode::Reply, None);
    composer.set_text("orphan");

    let transport = RecordingTransport::default();
    let result = composer.submit(&transport).await;
    assert!(matches!(
        result,
        Err(ComposerError::Validation(ValidationError::MissingTarget))
    ));
}
