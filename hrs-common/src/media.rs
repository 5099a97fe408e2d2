//! Media slots and accepted audio formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// MIME types offered as a hint to the file picker.
///
/// Not re-validated before submission; the service makes the final call.
pub const ACCEPTED_AUDIO_MIME_TYPES: [&str; 4] = ["audio/mp3", "audio/wav", "audio/flac", "audio/ogg"];

/// Fallback MIME type for files with an unrecognized extension
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One of the three fixed playback roles a media URL can occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSlot {
    /// The recording the user uploaded
    Upload,
    /// Generated harmony on its own
    Preview,
    /// Upload mixed with the generated harmony
    Combined,
}

impl MediaSlot {
    pub const ALL: [MediaSlot; 3] = [MediaSlot::Upload, MediaSlot::Preview, MediaSlot::Combined];

    /// Transport label while nothing is playing
    pub fn idle_label(&self) -> &'static str {
        match self {
            MediaSlot::Upload | MediaSlot::Preview => "Play",
            MediaSlot::Combined => "Play Combined",
        }
    }

    /// Transport label while playback is active
    pub fn active_label(&self) -> &'static str {
        match self {
            MediaSlot::Upload | MediaSlot::Preview => "Pause",
            MediaSlot::Combined => "Pause Combined",
        }
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSlot::Upload => write!(f, "upload"),
            MediaSlot::Preview => write!(f, "preview"),
            MediaSlot::Combined => write!(f, "combined"),
        }
    }
}

/// Guess a MIME type from a file name's extension
///
/// Returns `None` for extensions outside the accepted set.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "flac" => Some("audio/flac"),
        "ogg" => Some("audio/ogg"),
        _ => None,
    }
}
