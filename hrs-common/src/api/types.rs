//! Analysis Service request/response types
//!
//! Field names follow the service's snake_case JSON. Chord lists are decoded
//! leniently: older service builds send a comma-separated string where newer
//! ones send an array.

use crate::Instrument;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ========================================
// Tonal Features
// ========================================

/// Opaque tonal analysis produced by the service
///
/// Stored verbatim after a successful analyze and sent back unchanged on
/// regenerate. There are no mutators; a new value only ever comes from the
/// service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TonalFeatures(Map<String, Value>);

impl TonalFeatures {
    /// Look up a single attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Pretty-printed JSON for display
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for TonalFeatures {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ========================================
// Responses
// ========================================

/// Successful `/recommend` response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzeResponse {
    pub tonal_features: TonalFeatures,
    #[serde(default, deserialize_with = "chord_labels")]
    pub recommended_chords: Vec<String>,
    #[serde(default, deserialize_with = "chord_labels")]
    pub chord_progression: Vec<String>,
    #[serde(default)]
    pub harmony_preview_url: Option<String>,
    #[serde(default)]
    pub uploaded_audio_url: Option<String>,
    #[serde(default)]
    pub combined_audio_url: Option<String>,
}

/// `/regenerate-harmony` request body
#[derive(Debug, Clone, Serialize)]
pub struct RegenerateRequest<'a> {
    pub instrument: Instrument,
    pub features: &'a TonalFeatures,
}

/// Successful `/regenerate-harmony` response body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegenerateResponse {
    #[serde(default, deserialize_with = "chord_labels")]
    pub recommended_chords: Vec<String>,
    #[serde(default, deserialize_with = "chord_labels")]
    pub chord_progression: Vec<String>,
    #[serde(default)]
    pub harmony_preview_url: Option<String>,
    #[serde(default)]
    pub combined_audio_url: Option<String>,
}

/// Error body returned with a non-success status
///
/// The service sends `{"error": "msg"}`; structured
/// `{"error": {"code": .., "message": "msg"}}` bodies are accepted too.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Structured { message: String },
}

impl ErrorResponse {
    /// Service-supplied message, if non-blank
    pub fn message(&self) -> Option<&str> {
        let msg = match &self.error {
            ErrorDetail::Message(m) => m,
            ErrorDetail::Structured { message } => message,
        };
        let msg = msg.trim();
        (!msg.is_empty()).then_some(msg)
    }

    /// Parse an error body, tolerating anything that isn't one
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

// ========================================
// Chord label decoding
// ========================================

#[derive(Deserialize)]
#[serde(untagged)]
enum ChordLabels {
    List(Vec<String>),
    Text(String),
}

fn chord_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = match Option::<ChordLabels>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ChordLabels::List(list)) => list
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(ChordLabels::Text(text)) => text
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };
    Ok(labels)
}
