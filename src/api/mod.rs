//! External collaborators of the composer
//!
//! Everything the composer needs from the outside world goes through one of
//! these narrow traits: media storage, emoji packages, contacts, identity
//! lookups and the post transport.

pub mod http;
mod identity;
mod local;

pub use identity::IdentityCache;
pub use local::{ContactList, EmojiCatalog};

use anyhow::Result;

use crate::models::{
    Contact, EmojiDictionary, EmojiPackage, Identity, MediaAttachment, MediaFile, TargetRef,
};

/// Storage for uploaded media
#[allow(async_fn_in_trait)]
pub trait MediaStore {
    /// Upload a file, returning its public URL.
    ///
    /// Failure is signaled by `None`, never by a panic or error.
    async fn upload(&self, file: &MediaFile) -> Option<String>;
}

/// Read-only, refreshable list of emoji packages
pub trait EmojiIndexSource {
    /// Current packages
    fn packages(&self) -> Vec<EmojiPackage>;

    /// Counter bumped whenever the package list changes
    fn revision(&self) -> u64;
}

/// Read-only list of mention candidates
pub trait ContactDirectory {
    /// Current contacts
    fn contacts(&self) -> Vec<Contact>;

    /// Counter bumped whenever the contact list changes
    fn revision(&self) -> u64;
}

/// Resolves entity IDs to display identities
#[allow(async_fn_in_trait)]
pub trait IdentityResolver {
    /// Look up one entity
    async fn resolve(&self, id: &str) -> Result<Identity>;
}

/// Per-post options passed alongside body and destinations
#[derive(Debug, Clone, Copy)]
pub struct PostOptions<'a> {
    /// Emojis referenced by the body
    pub emojis: &'a EmojiDictionary,
    /// Literal `@token` matches
    pub mentions: &'a [String],
    /// Restricted recipients
    pub whisper: &'a [String],
    /// Alternate persona
    pub profile_override_id: Option<&'a str>,
    /// Attachments (media posts)
    pub media: &'a [MediaAttachment],
    /// Target message (replies and reroutes)
    pub target: Option<&'a TargetRef>,
}

/// Post transport, one operation per composer mode.
///
/// Each operation rejects with an error carrying a human-readable message.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Publish a plain text post
    async fn plaintext(&self, body: &str, destinations: &[String], options: PostOptions<'_>)
    -> Result<()>;

    /// Publish a markdown post
    async fn markdown(&self, body: &str, destinations: &[String], options: PostOptions<'_>)
    -> Result<()>;

    /// Publish a media post
    async fn media(&self, body: &str, destinations: &[String], options: PostOptions<'_>)
    -> Result<()>;

    /// Publish a reply to `options.target`
    async fn reply(&self, body: &str, destinations: &[String], options: PostOptions<'_>)
    -> Result<()>;

    /// Reroute `options.target`, with an optional comment
    async fn reroute(&self, body: &str, destinations: &[String], options: PostOptions<'_>)
    -> Result<()>;
}
