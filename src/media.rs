use std::fs;
use std::path::{Path, PathBuf};

use crate::model::task::AttachmentKind;

/// Largest file the attach command will reference. Boards are meant to
/// stay light; anything bigger belongs in real storage with a link.
pub const MAX_ATTACHMENT_BYTES: u64 = 25 * 1024 * 1024;

/// A storable reference produced from user-supplied media, ready to
/// become an `Attachment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub name: String,
    pub kind: AttachmentKind,
    pub url: String,
}

/// Error type for media encoding
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("could not read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a regular file")]
    NotAFile { path: PathBuf },
    #[error("{path} is {size} bytes; attachments are capped at {max} bytes")]
    TooLarge { path: PathBuf, size: u64, max: u64 },
}

/// Turn a local file into an attachment reference. The file stays where
/// it is; the reference is an absolute `file://` URL plus a kind
/// inferred from the extension.
pub fn encode_file(path: &Path) -> Result<MediaRef, MediaError> {
    encode_file_with_cap(path, MAX_ATTACHMENT_BYTES)
}

fn encode_file_with_cap(path: &Path, cap: u64) -> Result<MediaRef, MediaError> {
    let metadata = fs::metadata(path).map_err(|e| MediaError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(MediaError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    if metadata.len() > cap {
        return Err(MediaError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: cap,
        });
    }
    let absolute = fs::canonicalize(path).map_err(|e| MediaError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(MediaRef {
        kind: kind_for_path(&absolute),
        url: format!("file://{}", absolute.display()),
        name,
    })
}

/// Build a link reference from a URL, for attachments that live
/// elsewhere. The display name falls back to the URL's last segment.
pub fn link_ref(url: &str, name: Option<&str>) -> MediaRef {
    let fallback = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url);
    MediaRef {
        name: name.unwrap_or(fallback).to_string(),
        kind: AttachmentKind::Link,
        url: url.to_string(),
    }
}

/// Guess attachment kind from a file extension. Anything unrecognized is
/// a plain document.
pub fn kind_for_path(path: &Path) -> AttachmentKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "heic") => AttachmentKind::Image,
        Some("mp3" | "wav" | "m4a" | "ogg" | "flac") => AttachmentKind::Audio,
        Some("mp4" | "mov" | "mkv" | "webm" | "avi") => AttachmentKind::Video,
        _ => AttachmentKind::Document,
    }
}
