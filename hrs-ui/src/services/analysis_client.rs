//! Analysis Service client
//!
//! Performs the two network operations of the workflow:
//! - `POST /recommend` (multipart: `audio` + `instrument`)
//! - `POST /regenerate-harmony` (JSON: `instrument` + `features`)
//!
//! Every non-success status, network error, or undecodable body is normalized
//! into a [`TransportFailure`] carrying one display message. Calls are single
//! shot; nothing here retries.

use crate::state::AudioUpload;
use async_trait::async_trait;
use hrs_common::api::{
    AnalyzeResponse, ErrorResponse, RegenerateRequest, RegenerateResponse, TonalFeatures,
    RECOMMEND_PATH, REGENERATE_PATH,
};
use hrs_common::Instrument;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "hrs-ui/0.1.0";

/// Fallback message when an analyze failure carries no service message
pub const ANALYZE_FALLBACK_MESSAGE: &str = "An error occurred during processing.";

/// Fallback message when a regenerate failure carries no service message
pub const REGENERATE_FALLBACK_MESSAGE: &str = "Failed to regenerate harmony.";

/// Normalized failure of either Analysis Service call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub message: String,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful analyze result
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub tonal_features: TonalFeatures,
    pub chords: Vec<String>,
    pub progression: Vec<String>,
    pub preview_url: Option<String>,
    pub uploaded_audio_url: Option<String>,
    pub combined_url: Option<String>,
}

/// Successful regenerate result
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonyResult {
    pub chords: Vec<String>,
    pub progression: Vec<String>,
    pub preview_url: Option<String>,
    pub combined_url: Option<String>,
}

/// The Analysis Service as seen by the workflow controller
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Upload a recording for tonal analysis and a first harmony
    async fn analyze(
        &self,
        upload: &AudioUpload,
        instrument: Instrument,
    ) -> Result<AnalysisResult, TransportFailure>;

    /// Request a new harmony from previously extracted features
    async fn regenerate_harmony(
        &self,
        instrument: Instrument,
        features: &TonalFeatures,
    ) -> Result<HarmonyResult, TransportFailure>;
}

/// HTTP implementation of [`AnalysisService`]
pub struct AnalysisClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl AnalysisClient {
    /// Create a client for the service at `base_url`
    ///
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> hrs_common::Result<Self> {
        // Slash-terminated so relative media paths resolve under the base path
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| {
            hrs_common::Error::Config(format!("Invalid service URL {:?}: {}", base_url, e))
        })?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| hrs_common::Error::Config(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Resolve a service-relative media path against the base URL
    ///
    /// Absolute URLs pass through and blank values become `None`. A relative
    /// path (`static/a.mp3`) lands under the base path like the endpoints do;
    /// a root path (`/static/a.mp3`) is taken from the host root.
    pub fn resolve_media_url(&self, raw: Option<String>) -> Option<String> {
        let raw = raw?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if Url::parse(raw).is_ok() {
            return Some(raw.to_string());
        }
        match self.base_url.join(raw) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!(url = %raw, error = %e, "Could not resolve media URL, using as-is");
                Some(raw.to_string())
            }
        }
    }

    /// Decode a JSON body, or turn a failed response into its message
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, TransportFailure> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ErrorResponse::from_body(&body)
                .and_then(|e| e.message().map(str::to_string))
                .unwrap_or_else(|| fallback.to_string());
            warn!(status = status.as_u16(), message = %message, "Analysis Service returned error");
            return Err(TransportFailure::new(message));
        }

        response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Analysis Service response");
            TransportFailure::new(fallback)
        })
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn analyze(
        &self,
        upload: &AudioUpload,
        instrument: Instrument,
    ) -> Result<AnalysisResult, TransportFailure> {
        let url = self.endpoint(RECOMMEND_PATH);

        debug!(
            url = %url,
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            instrument = %instrument,
            "Submitting audio for analysis"
        );

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| {
                warn!(mime = %upload.mime_type, error = %e, "Invalid upload MIME type");
                TransportFailure::new(ANALYZE_FALLBACK_MESSAGE)
            })?;
        let form = Form::new()
            .part("audio", part)
            .text("instrument", instrument.as_str());

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Analyze request failed");
                TransportFailure::new(ANALYZE_FALLBACK_MESSAGE)
            })?;

        let body: AnalyzeResponse = Self::read_json(response, ANALYZE_FALLBACK_MESSAGE).await?;

        info!(
            instrument = %instrument,
            chords = body.recommended_chords.len(),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            tonal_features: body.tonal_features,
            chords: body.recommended_chords,
            progression: body.chord_progression,
            preview_url: self.resolve_media_url(body.harmony_preview_url),
            uploaded_audio_url: self.resolve_media_url(body.uploaded_audio_url),
            combined_url: self.resolve_media_url(body.combined_audio_url),
        })
    }

    async fn regenerate_harmony(
        &self,
        instrument: Instrument,
        features: &TonalFeatures,
    ) -> Result<HarmonyResult, TransportFailure> {
        let url = self.endpoint(REGENERATE_PATH);

        debug!(url = %url, instrument = %instrument, "Requesting harmony regeneration");

        let request = RegenerateRequest {
            instrument,
            features,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Regenerate request failed");
                TransportFailure::new(REGENERATE_FALLBACK_MESSAGE)
            })?;

        let body: RegenerateResponse =
            Self::read_json(response, REGENERATE_FALLBACK_MESSAGE).await?;

        info!(
            instrument = %instrument,
            chords = body.recommended_chords.len(),
            "Harmony regenerated"
        );

        Ok(HarmonyResult {
            chords: body.recommended_chords,
            progression: body.chord_progression,
            preview_url: self.resolve_media_url(body.harmony_preview_url),
            combined_url: self.resolve_media_url(body.combined_audio_url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(AnalysisClient::new("http://127.0.0.1:5000", None).is_ok());
        assert!(AnalysisClient::new("http://127.0.0.1:5000", Some(Duration::from_secs(5))).is_ok());
        assert!(AnalysisClient::new("not a url", None).is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = AnalysisClient::new("http://host:5000/api/", None).unwrap();
        assert_eq!(client.endpoint(RECOMMEND_PATH), "http://host:5000/api/recommend");

        let client = AnalysisClient::new("http://host:5000", None).unwrap();
        assert_eq!(
            client.endpoint(REGENERATE_PATH),
            "http://host:5000/regenerate-harmony"
        );
    }

    #[test]
    fn test_resolve_media_url() {
        let client = AnalysisClient::new("http://127.0.0.1:5000", None).unwrap();

        assert_eq!(
            client.resolve_media_url(Some("/static/audio/a.mp3".into())).as_deref(),
            Some("http://127.0.0.1:5000/static/audio/a.mp3")
        );
        assert_eq!(
            client.resolve_media_url(Some("https://cdn.example/a.mp3".into())).as_deref(),
            Some("https://cdn.example/a.mp3")
        );
        assert_eq!(client.resolve_media_url(Some("  ".into())), None);
        assert_eq!(client.resolve_media_url(None), None);
    }

    #[test]
    fn test_resolve_media_url_under_base_path() {
        for base in ["http://host:5000/api", "http://host:5000/api/"] {
            let client = AnalysisClient::new(base, None).unwrap();
            assert_eq!(client.endpoint(RECOMMEND_PATH), "http://host:5000/api/recommend");
            assert_eq!(
                client.resolve_media_url(Some("static/audio/a.mp3".into())).as_deref(),
                Some("http://host:5000/api/static/audio/a.mp3")
            );
            assert_eq!(
                client.resolve_media_url(Some("/static/audio/a.mp3".into())).as_deref(),
                Some("http://host:5000/static/audio/a.mp3")
            );
        }
    }
}
