//! Workflow data model
//!
//! Everything here is owned by the workflow controller. The player registry
//! only ever sees a cloned [`MediaUrls`] snapshot.

use hrs_common::api::TonalFeatures;
use hrs_common::events::WorkflowStatus;
use hrs_common::media::{mime_for_path, DEFAULT_MIME_TYPE};
use hrs_common::{Instrument, MediaSlot};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Audio file chosen by the user
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    ///
    /// Unknown extensions are sent as `application/octet-stream`; the service
    /// decides whether it can decode them.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let mime_type = match mime_for_path(path) {
            Some(mime) => mime,
            None => {
                debug!(file = %path.display(), "Unrecognized audio extension, sending as octet-stream");
                DEFAULT_MIME_TYPE
            }
        };

        Ok(Self::new(file_name, mime_type, bytes))
    }
}

/// File + instrument the user has picked so far
#[derive(Debug, Clone, Default)]
pub struct UploadSelection {
    pub file: Option<Arc<AudioUpload>>,
    pub instrument: Option<Instrument>,
}

/// Chord recommendation, replaced wholesale on every success
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub chords: Vec<String>,
    pub progression: Vec<String>,
    pub preview_url: Option<String>,
}

impl Recommendation {
    /// Progression as "C -> G -> Am -> F"
    pub fn progression_display(&self) -> String {
        self.progression.join(" -> ")
    }
}

/// Media URLs for the three playback slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaUrls {
    /// Set only by submit
    pub uploaded_audio_url: Option<String>,
    pub preview_url: Option<String>,
    pub combined_url: Option<String>,
}

impl MediaUrls {
    pub fn get(&self, slot: MediaSlot) -> Option<&str> {
        match slot {
            MediaSlot::Upload => self.uploaded_audio_url.as_deref(),
            MediaSlot::Preview => self.preview_url.as_deref(),
            MediaSlot::Combined => self.combined_url.as_deref(),
        }
    }
}

/// Complete controller-owned state
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub selection: UploadSelection,
    pub tonal_features: Option<TonalFeatures>,
    pub recommendation: Option<Recommendation>,
    pub media: MediaUrls,
    pub status: WorkflowStatus,
    pub error: Option<String>,
}
