//! Attachment list and the two upload flows.
//!
//! Both flows handle files strictly one at a time: an upload is fully
//! awaited before the next file is touched, so draft splices never race.

use crate::api::MediaStore;
use crate::error::UploadError;
use crate::models::{Draft, MediaAttachment, MediaFile, MediaKind, MediaPatch, inline_literal};

use super::blurhash::BlurPreviewer;

/// Ordered attachments of a media post. Identity is the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaAttachmentList {
    items: Vec<MediaAttachment>,
}

impl MediaAttachmentList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an uploaded attachment at the end
    pub fn append(&mut self, attachment: MediaAttachment) {
        self.items.push(attachment);
    }

    /// Remove the attachment at `index`
    pub fn remove_at(&mut self, index: usize) -> Option<MediaAttachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Apply a partial update to the attachment at `index`.
    ///
    /// Returns false when the index is out of range.
    pub fn patch_at(&mut self, index: usize, patch: MediaPatch) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Attachment at `index`
    pub fn get(&self, index: usize) -> Option<&MediaAttachment> {
        self.items.get(index)
    }

    /// Number of attachments
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in order
    pub fn iter(&self) -> impl Iterator<Item = &MediaAttachment> {
        self.items.iter()
    }

    /// Borrow as a slice
    pub fn as_slice(&self) -> &[MediaAttachment] {
        &self.items
    }

    /// Remove and return every attachment, in order
    pub fn drain(&mut self) -> Vec<MediaAttachment> {
        std::mem::take(&mut self.items)
    }

    /// Remove every attachment
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Compute the blur preview off the async runtime.
///
/// Only images get a preview; other kinds return `Ok(None)`.
pub async fn blur_preview(
    file: &MediaFile,
    previewer: BlurPreviewer,
) -> Result<Option<String>, UploadError> {
    if file.kind() != MediaKind::Image {
        return Ok(None);
    }

    let bytes = file.bytes.clone();
    let result = tokio::task::spawn_blocking(move || previewer.encode_bytes(&bytes)).await;

    match result {
        Ok(Ok(hash)) => Ok(Some(hash)),
        Ok(Err(e)) => Err(UploadError::Preview {
            name: file.name.clone(),
            reason: format!("{e:#}"),
        }),
        Err(e) => Err(UploadError::Preview {
            name: file.name.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Attach flow for one file: preview, upload, build the record.
///
/// Nothing is produced unless the store returns a URL.
pub async fn upload_attachment(
    file: &MediaFile,
    store: &impl MediaStore,
    previewer: BlurPreviewer,
) -> Result<MediaAttachment, UploadError> {
    let preview = blur_preview(file, previewer).await?;

    let url = store.upload(file).await.ok_or_else(|| UploadError::Rejected {
        name: file.name.clone(),
    })?;

    tracing::debug!("Uploaded {} -> {}", file.name, url);
    let mut attachment = MediaAttachment::new(url, file.mime_type.clone());
    attachment.blur_preview = preview;
    Ok(attachment)
}

/// Attach flow over several files, appending each success in order
pub async fn attach_files(
    list: &mut MediaAttachmentList,
    files: &[MediaFile],
    store: &impl MediaStore,
    previewer: BlurPreviewer,
) -> Vec<UploadError> {
    let mut errors = Vec::new();

    for file in files {
        match upload_attachment(file, store, previewer).await {
            Ok(attachment) => list.append(attachment),
            Err(e) => {
                tracing::warn!("{e}");
                errors.push(e);
            }
        }
    }

    errors
}

/// Temporary literal shown in the draft while a file uploads
fn placeholder(name: &str) -> String {
    format!("![Uploading {name}...]({})", uuid::Uuid::new_v4())
}

/// Literal left in the draft when an inline upload fails
pub fn failure_marker(name: &str) -> String {
    format!("![Upload failed: {name}]()")
}

/// Literal for a successfully uploaded file
fn uploaded_literal(file: &MediaFile, url: &str) -> String {
    inline_literal(url, file.kind()).unwrap_or_else(|| format!("[{}]({url})", file.name))
}

/// Swap the first occurrence of `placeholder`, keeping the cursor anchored
fn replace_placeholder(draft: &mut Draft, placeholder: &str, replacement: &str) {
    let Some(start) = draft.text.find(placeholder) else {
        return;
    };
    let end = start + placeholder.len();
    let cursor = draft.cursor;

    draft.text.replace_range(start..end, replacement);

    let cursor = if cursor >= end {
        cursor - placeholder.len() + replacement.len()
    } else if cursor > start {
        start + replacement.len()
    } else {
        cursor
    };
    draft.set_cursor(cursor);
}

/// Inline paste/drop flow: each file gets a placeholder at the cursor that
/// is replaced by its literal once uploaded, or by a failure marker
pub async fn paste_files(
    draft: &mut Draft,
    files: &[MediaFile],
    store: &impl MediaStore,
) -> Vec<UploadError> {
    let mut errors = Vec::new();

    for file in files {
        let pending = placeholder(&file.name);
        draft.insert(&pending);

        match store.upload(file).await {
            Some(url) => {
                replace_placeholder(draft, &pending, &uploaded_literal(file, &url));
            }
            None => {
                tracing::warn!("Inline upload of {} failed", file.name);
                replace_placeholder(draft, &pending, &failure_marker(&file.name));
                errors.push(UploadError::Rejected {
                    name: file.name.clone(),
                });
            }
        }
    }

    errors
}
