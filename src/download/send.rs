//! Delivery of a finished download to the chat.
//!
//! Files at or above the upload threshold are not sent; everything else is
//! read into memory and uploaded as audio or video depending on the tier.
//! The file is removed after the attempt whatever the outcome.

use std::io;
use std::path::Path;

use teloxide::types::{ChatId, MessageId};

use crate::core::config;
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::download::error::{ToolError, ToolErrorKind};
use crate::download::formats::Quality;
use crate::telegram::client::ChatClient;

pub const TOO_LARGE_STATUS: &str = "File is too large to send via Telegram (>50MB).";
pub const TOO_LARGE_HINT: &str =
    "File is too large. Consider using a different quality option or downloading a shorter video.";

/// How a file goes out to the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttachmentKind {
    Audio,
    Video,
}

impl AttachmentKind {
    pub fn for_quality(quality: Quality) -> Self {
        if quality.is_audio() {
            AttachmentKind::Audio
        } else {
            AttachmentKind::Video
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { kind: AttachmentKind, size: u64 },
    TooLarge { size: u64 },
    UploadFailed(String),
}

/// Whether a file of `size` bytes may be uploaded.
pub fn within_upload_limit(size: u64) -> bool {
    size < config::delivery::MAX_UPLOAD_BYTES
}

/// Edits the status message; failures are logged and otherwise ignored.
pub async fn update_status(client: &dyn ChatClient, chat: ChatId, status: MessageId, text: &str) {
    if let Err(e) = client.edit_text(chat, status, text).await {
        log::warn!("Failed to update status message {} in chat {}: {}", status.0, chat, e);
    }
}

async fn remove_file(path: &Path) {
    log::info!("Deleting file: {}", path.display());
    match fs_err::tokio::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::error!("Error deleting file: {}", e),
    }
}

/// Sends `path` to `chat` and deletes it afterwards.
///
/// Returns a [`ToolErrorKind::FileMissing`] error when the file cannot be
/// inspected (e.g. its directory was purged mid-flight); upload failures are
/// reported to the user and come back as [`DeliveryOutcome::UploadFailed`].
pub async fn deliver(
    client: &dyn ChatClient,
    chat: ChatId,
    status: MessageId,
    path: &Path,
    quality: Quality,
) -> AppResult<DeliveryOutcome> {
    let size = match fs_err::tokio::metadata(path).await {
        Ok(meta) => meta.len(),
        Err(e) => {
            remove_file(path).await;
            return Err(ToolError::new(ToolErrorKind::FileMissing, e.to_string()).into());
        }
    };
    log::info!("File size: {:.2} MB", size as f64 / (1024.0 * 1024.0));

    if !within_upload_limit(size) {
        update_status(client, chat, status, TOO_LARGE_STATUS).await;
        if let Err(e) = client.send_text(chat, TOO_LARGE_HINT).await {
            log::warn!("Failed to send size notice to chat {}: {}", chat, e);
        }
        remove_file(path).await;
        metrics::record_upload("none", "too_large");
        return Ok(DeliveryOutcome::TooLarge { size });
    }

    update_status(client, chat, status, "Upload to Telegram in progress...").await;

    let kind = AttachmentKind::for_quality(quality);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    let result = match fs_err::tokio::read(path).await {
        Ok(bytes) => match kind {
            AttachmentKind::Audio => client.send_audio(chat, bytes, &file_name).await,
            AttachmentKind::Video => client.send_video(chat, bytes, &file_name).await,
        }
        .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    remove_file(path).await;

    let kind_label: &'static str = kind.into();
    match result {
        Ok(()) => {
            metrics::record_upload(kind_label, "ok");
            update_status(client, chat, status, "Download completed!").await;
            Ok(DeliveryOutcome::Sent { kind, size })
        }
        Err(e) => {
            log::error!("Error sending file: {}", e);
            metrics::record_upload(kind_label, "error");
            update_status(client, chat, status, &format!("Error sending file to Telegram: {}", e)).await;
            Ok(DeliveryOutcome::UploadFailed(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(within_upload_limit(0));
        assert!(within_upload_limit(52_428_799));
        assert!(!within_upload_limit(52_428_800));
        assert!(!within_upload_limit(u64::MAX));
    }

    #[test]
    fn test_attachment_kind_by_tier() {
        assert_eq!(AttachmentKind::for_quality(Quality::Audio), AttachmentKind::Audio);
        for quality in [Quality::Best, Quality::P480, Quality::P720, Quality::P1080] {
            assert_eq!(AttachmentKind::for_quality(quality), AttachmentKind::Video);
        }
    }
}
