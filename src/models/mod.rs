//! Data models for Quill

mod contact;
mod draft;
mod emoji;
mod media;
mod mode;
mod payload;

pub use contact::{Contact, Identity};
pub use draft::{Draft, floor_char_boundary};
pub use emoji::{EmojiDictionary, EmojiPackage, EmojiRef, PackageEmoji};
pub use media::{MediaAttachment, MediaFile, MediaKind, MediaPatch, inline_literal};
pub use mode::{ComposerMode, MODE_TABLE, ModeEntry, TargetRef};
pub use payload::SubmissionPayload;
