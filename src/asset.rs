//! Uploaded asset metadata and staging.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// The role an uploaded image plays in a style-transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The photograph of the person whose hairstyle is replaced.
    Face,
    /// The hairstyle reference photograph.
    Style,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Face => write!(f, "face"),
            Self::Style => write!(f, "style"),
        }
    }
}

/// A file that landed on disk at the upload boundary.
///
/// Owned exclusively by the request that created it; the reaper deletes the
/// stored path after the configured delay, success or failure.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Filename as supplied by the client.
    pub original_name: String,

    /// Where the upload was staged on disk.
    pub stored_path: PathBuf,

    /// Size of the stored file in bytes.
    pub size_bytes: u64,

    /// MIME type declared by the client.
    pub mime_type: String,
}

/// Copy a local file into the upload directory as a staged asset.
///
/// The stored filename is `{millis}_{sanitized-basename}` so concurrent
/// requests never collide.
///
/// # Errors
///
/// Returns an error if the file cannot be read or copied.
pub fn stage_upload(source: &Path, upload_dir: &Path) -> Result<UploadedAsset> {
    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let stored_name = format!("{}_{}", unix_millis(), sanitize_filename(&original_name));
    let stored_path = upload_dir.join(stored_name);

    std::fs::copy(source, &stored_path)?;
    let size_bytes = std::fs::metadata(&stored_path)?.len();

    Ok(UploadedAsset {
        original_name,
        stored_path,
        size_bytes,
        mime_type: mime_for_extension(source),
    })
}

/// Milliseconds since the Unix epoch, used for collision-free filenames.
#[must_use]
pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Strip everything but alphanumerics, dots and dashes from a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect()
}

/// Guess a declared MIME type from the file extension.
fn mime_for_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}
