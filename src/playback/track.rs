//! Track records and file intake.

use std::path::{Path, PathBuf};

use crate::audio::UploadStore;

/// One entry in the track list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Bundled asset path (relative to the asset root) or upload locator
    pub locator: String,
    /// Display name
    pub name: String,
    /// Locator is a temporary upload that must be revoked on removal
    pub is_upload: bool,
}

impl Track {
    /// Track for a bundled asset; the name is the file name of the locator
    pub fn bundled(locator: &str) -> Self {
        let name = locator.rsplit('/').next().unwrap_or(locator).to_string();
        Self {
            locator: locator.to_string(),
            name,
            is_upload: false,
        }
    }

    /// Register `candidate` with the upload store and build its track
    pub fn upload(candidate: &FileCandidate, uploads: &UploadStore) -> Self {
        Self {
            locator: uploads.create(&candidate.path),
            name: candidate.name.clone(),
            is_upload: true,
        }
    }
}

/// A user-supplied file before it is accepted as a track
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    /// Guessed MIME type, empty when unknown
    pub media_type: String,
}

impl FileCandidate {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = guess_media_type(&name).unwrap_or("").to_string();
        Self {
            path: path.to_path_buf(),
            name,
            media_type,
        }
    }

    /// Audio media type, or an `.mp3` name in any case
    pub fn is_accepted(&self) -> bool {
        self.media_type.starts_with("audio") || self.name.to_ascii_lowercase().ends_with(".mp3")
    }
}

/// Media type for common audio extensions
pub fn guess_media_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "aif" | "aiff" => "audio/aiff",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(media_type)
}
