//! Composer core: trigger detection, suggestions, attachments, the mode
//! state machine and submission.

pub mod attachments;
pub mod blurhash;
mod composer;
pub mod overlay;
pub mod submit;
pub mod suggest;
pub mod trigger;

pub use attachments::MediaAttachmentList;
pub use blurhash::BlurPreviewer;
pub use composer::{Composer, Notice, NoticeLevel};
pub use overlay::{KeyOutcome, OverlayKey, Presentation, SuggestionOverlay};
pub use suggest::{ContactIndex, EmojiIndex, Suggestion, SuggestionEngine};
pub use trigger::{Trigger, TriggerKind, detect};
