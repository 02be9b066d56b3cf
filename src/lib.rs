//! # Quill
//!
//! The message composition core of a social-feed client.
//!
//! ## Overview
//!
//! Quill owns everything between a keystroke and a published post: it tracks
//! the draft and cursor, detects `:emoji` and `@mention` triggers, ranks
//! suggestions, uploads media, renders the markup dialect used by feed
//! messages and hands a finished payload to the transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Composer                            │
//! │   Draft, mode state machine, destinations, submit lifecycle │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │    Suggest      │ │   Attachments   │ │     Submit      │
//! │                 │ │                 │ │                 │
//! │ • Triggers      │ │ • Upload        │ │ • Validation    │
//! │ • Emoji index   │ │ • Blur preview  │ │ • Mentions      │
//! │ • Overlay       │ │ • Paste inline  │ │ • Destinations  │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Markup      │ │       API       │ │     Store       │
//! │                 │ │                 │ │                 │
//! │ • Parse         │ │ • MediaStore    │ │ • Preferences   │
//! │ • Sanitize      │ │ • Transport     │ │ • Frequent      │
//! │ • Render views  │ │ • Identities    │ │   emojis        │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Collaborator traits (media, emoji packages, contacts, transport)
//! - [`compose`] — Composer state, triggers, suggestions, attachments, submit
//! - [`config`] — Configuration management
//! - [`error`] — Typed composer errors
//! - [`markup`] — Markup parsing, sanitizing and view rendering
//! - [`models`] — Data models (Draft, `EmojiRef`, `MediaAttachment`, ...)
//! - [`store`] — `SQLite` preference store
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quill::store::MemoryStore;
//! use quill::{Composer, Config};
//!
//! let mut composer = Composer::new(&Config::default(), Arc::new(MemoryStore::new()));
//! composer.insert_text("hello :wa");
//! assert!(composer.trigger().is_active());
//! ```

#![doc(html_root_url = "https://docs.rs/quill/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod compose;
pub mod config;
pub mod error;
pub mod markup;
pub mod models;
pub mod paths;
pub mod store;

// Re-export main types for convenience
pub use compose::{BlurPreviewer, Composer, MediaAttachmentList, Notice, NoticeLevel};
pub use config::Config;
pub use error::{ComposerError, UploadError, ValidationError};
pub use markup::{View, render, render_lite};
pub use models::{
    ComposerMode, Draft, EmojiDictionary, EmojiRef, MediaAttachment, MediaFile, MediaKind,
    SubmissionPayload, TargetRef,
};
pub use store::{MemoryStore, PersistentStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
