//! Error kinds surfaced by the composer
//!
//! Every kind is recoverable: the composer session keeps running and the
//! draft is left in a state the user can retry from.

use thiserror::Error;

/// Why a submit was rejected before reaching the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body is empty or whitespace in a mode that needs text
    #[error("Message body is empty")]
    EmptyBody,
    /// Media mode with nothing attached
    #[error("Attach at least one file to post media")]
    NoAttachments,
    /// Reply or reroute without a bound target message
    #[error("No target message to reply to or reroute")]
    MissingTarget,
}

/// An upload that did not produce an attachment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The media store returned no URL
    #[error("Upload of {name} failed")]
    Rejected {
        /// File name
        name: String,
    },
    /// The blur preview worker failed before upload
    #[error("Could not prepare {name}: {reason}")]
    Preview {
        /// File name
        name: String,
        /// Underlying reason
        reason: String,
    },
}

/// Malformed structured data inside a reserved code fence.
///
/// Never shown to the user; the fence degrades to a plain code block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {fence} block: {reason}")]
pub struct ParseWarning {
    /// Fence language tag
    pub fence: String,
    /// Parser message
    pub reason: String,
}

/// Top-level composer error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    /// Local validation failed, transport not called
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An upload failed
    #[error(transparent)]
    Upload(#[from] UploadError),
    /// The transport rejected the submission
    #[error("Post failed: {0}")]
    Submission(String),
}
