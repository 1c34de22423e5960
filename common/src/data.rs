use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A local file the user has picked for upload. Immutable once built;
/// the upload session takes ownership when the selection is accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CandidateFile {
    /// Where the bytes live on disk.
    pub path: PathBuf,
    /// Bare file name, without any directory components.
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl CandidateFile {
    /// Builds a candidate from a local path. The mime type is derived from
    /// the file extension; unrecognised extensions get
    /// `application/octet-stream`, which the validator will reject.
    pub fn new(path: PathBuf, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_for_path(&path).to_string();
        Self {
            path,
            name,
            size,
            mime_type,
        }
    }

    /// Builds a candidate from wire metadata, for files that arrive over
    /// HTTP and have no local path of their own.
    pub fn from_parts(name: String, size: u64, mime_type: String) -> Self {
        Self {
            path: PathBuf::from(&name),
            name,
            size,
            mime_type,
        }
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg") | Some("ogv") => "video/ogg",
        Some("mov") | Some("qt") => "video/quicktime",
        _ => "application/octet-stream",
    }
}
