//! Media attachment models

use serde::{Deserialize, Serialize};

/// Broad media category derived from a MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image (JPEG, PNG, GIF, WebP)
    Image,
    /// Video (MP4, WebM)
    Video,
    /// Anything else
    Unknown,
}

impl MediaKind {
    /// Classify a MIME type
    pub fn from_mime(mime_type: &str) -> Self {
        let top = mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Unknown,
        }
    }
}

/// An uploaded attachment waiting to be posted with the draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// Media URL returned by the media store
    pub url: String,
    /// MIME type of the uploaded file
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Blur preview hash computed before upload
    #[serde(rename = "blurhash", default, skip_serializing_if = "Option::is_none")]
    pub blur_preview: Option<String>,
    /// Free-form flag (e.g. sensitive content marker)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

impl MediaAttachment {
    /// Create an attachment without preview or flag
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.into(),
            blur_preview: None,
            flag: None,
        }
    }

    /// Media category of this attachment
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }

    /// Inline markup literal for this attachment, if it has one.
    ///
    /// Images become `![image](url)`, videos an inline `<video>` element.
    pub fn inline_literal(&self) -> Option<String> {
        inline_literal(&self.url, self.kind())
    }

    /// Apply a partial update
    pub fn apply(&mut self, patch: MediaPatch) {
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(mime_type) = patch.mime_type {
            self.mime_type = mime_type;
        }
        if let Some(blur) = patch.blur_preview {
            self.blur_preview = blur;
        }
        if let Some(flag) = patch.flag {
            self.flag = flag;
        }
    }
}

/// Build the inline literal for a media URL of the given kind
pub fn inline_literal(url: &str, kind: MediaKind) -> Option<String> {
    match kind {
        MediaKind::Image => Some(format!("![image]({url})")),
        MediaKind::Video => Some(format!("<video controls src=\"{url}\"></video>")),
        MediaKind::Unknown => None,
    }
}

/// Partial update for an attachment. `None` leaves a field as is; for the
/// optional fields `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPatch {
    /// New URL
    pub url: Option<String>,
    /// New MIME type
    pub mime_type: Option<String>,
    /// New blur preview
    pub blur_preview: Option<Option<String>>,
    /// New flag
    pub flag: Option<Option<String>>,
}

/// A local file handed to the composer for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Create a new pending file
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Media category of this file
    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("VIDEO/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Unknown);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Unknown);
    }

    #[test]
    fn test_inline_literals() {
        let image = MediaAttachment::new("A", "image/png");
        assert_eq!(image.inline_literal().as_deref(), Some("![image](A)"));

        let video = MediaAttachment::new("B", "video/mp4");
        assert_eq!(
            video.inline_literal().as_deref(),
            Some("<video controls src=\"B\"></video>")
        );
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let mut media = MediaAttachment::new("A", "image/png");
        media.blur_preview = Some("LKO2?U%2Tw=w]~RBVZRi};RPxuwH".to_string());
        media.apply(MediaPatch {
            blur_preview: Some(None),
            flag: Some(Some("sensitive".to_string())),
            ..Default::default()
        });
        assert_eq!(media.blur_preview, None);
        assert_eq!(media.flag.as_deref(), Some("sensitive"));
        assert_eq!(media.url, "A");
    }
}
