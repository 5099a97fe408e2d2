//! Test Helper Utilities
//!
//! Shared fakes for hrs-ui integration tests:
//! - `MockAnalysisService`: scripted responses, call counters, optional gate
//!   that holds a request in flight until released
//! - `RecordingRendererFactory`: renderers that log every call

#![allow(dead_code)]

use async_trait::async_trait;
use hrs_common::api::TonalFeatures;
use hrs_common::events::EventBus;
use hrs_common::{Instrument, MediaSlot};
use hrs_ui::playback::{FinishNotifier, RendererFactory, WaveformRenderer};
use hrs_ui::services::{AnalysisResult, AnalysisService, HarmonyResult, TransportFailure};
use hrs_ui::{AudioUpload, WorkflowController};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ========================================
// Analysis Service fake
// ========================================

#[derive(Default)]
pub struct MockAnalysisService {
    analyze_results: Mutex<VecDeque<Result<AnalysisResult, TransportFailure>>>,
    regenerate_results: Mutex<VecDeque<Result<HarmonyResult, TransportFailure>>>,
    analyze_calls: AtomicUsize,
    regenerate_calls: AtomicUsize,
    last_regenerate: Mutex<Option<(Instrument, TonalFeatures)>>,
    gate: Option<Arc<Notify>>,
}

impl MockAnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for `gate.notify_one()` before answering
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_analyze(&self, result: Result<AnalysisResult, TransportFailure>) {
        self.analyze_results.lock().unwrap().push_back(result);
    }

    pub fn push_regenerate(&self, result: Result<HarmonyResult, TransportFailure>) {
        self.regenerate_results.lock().unwrap().push_back(result);
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn regenerate_calls(&self) -> usize {
        self.regenerate_calls.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        self.analyze_calls() + self.regenerate_calls()
    }

    pub fn last_regenerate(&self) -> Option<(Instrument, TonalFeatures)> {
        self.last_regenerate.lock().unwrap().clone()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn analyze(
        &self,
        _upload: &AudioUpload,
        _instrument: Instrument,
    ) -> Result<AnalysisResult, TransportFailure> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        self.analyze_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::new("no scripted analyze response")))
    }

    async fn regenerate_harmony(
        &self,
        instrument: Instrument,
        features: &TonalFeatures,
    ) -> Result<HarmonyResult, TransportFailure> {
        self.regenerate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_regenerate.lock().unwrap() = Some((instrument, features.clone()));
        self.wait_gate().await;
        self.regenerate_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure::new("no scripted regenerate response")))
    }
}

// ========================================
// Fixtures
// ========================================

pub fn features(pairs: &[(&str, Value)]) -> TonalFeatures {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k.to_string(), v.clone());
    }
    TonalFeatures::from(map)
}

pub fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Analyze result with all three media URLs set
pub fn analysis_ok(chords: &[&str]) -> AnalysisResult {
    AnalysisResult {
        tonal_features: features(&[("key", json!("C major")), ("duration_sec", json!(12.5))]),
        chords: labels(chords),
        progression: labels(chords),
        preview_url: Some("http://svc/static/audio/preview-1.mp3".to_string()),
        uploaded_audio_url: Some("http://svc/static/audio/upload-1.mp3".to_string()),
        combined_url: Some("http://svc/static/audio/combined-1.mp3".to_string()),
    }
}

pub fn harmony_ok(chords: &[&str], generation: u32) -> HarmonyResult {
    HarmonyResult {
        chords: labels(chords),
        progression: labels(chords),
        preview_url: Some(format!("http://svc/static/audio/preview-{}.mp3", generation)),
        combined_url: Some(format!("http://svc/static/audio/combined-{}.mp3", generation)),
    }
}

pub fn song_wav() -> AudioUpload {
    AudioUpload::new("song.wav", "audio/wav", b"RIFF\0\0\0\0WAVEfmt ".to_vec())
}

// ========================================
// Renderer fake
// ========================================

#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
    Create(MediaSlot),
    Load(MediaSlot, String),
    PlayPause(MediaSlot),
    Play(MediaSlot),
    Stop(MediaSlot),
    Seek(MediaSlot),
    Destroy(MediaSlot),
}

#[derive(Default)]
pub struct RendererLog {
    calls: Mutex<Vec<RendererCall>>,
    notifiers: Mutex<Vec<FinishNotifier>>,
}

impl RendererLog {
    pub fn calls(&self) -> Vec<RendererCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &RendererCall) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, RendererCall::Create(_)))
            .count()
    }

    /// Finish notifier of the most recent renderer created for `slot`
    pub fn latest_notifier(&self, slot: MediaSlot) -> Option<FinishNotifier> {
        self.notifiers
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|n| n.slot() == slot)
            .cloned()
    }

    fn record(&self, call: RendererCall) {
        self.calls.lock().unwrap().push(call);
    }
}

struct RecordingRenderer {
    slot: MediaSlot,
    playing: bool,
    log: Arc<RendererLog>,
}

impl WaveformRenderer for RecordingRenderer {
    fn load(&mut self, url: &str) {
        self.log.record(RendererCall::Load(self.slot, url.to_string()));
    }

    fn play_pause(&mut self) {
        self.playing = !self.playing;
        self.log.record(RendererCall::PlayPause(self.slot));
    }

    fn play(&mut self) {
        self.playing = true;
        self.log.record(RendererCall::Play(self.slot));
    }

    fn stop(&mut self) {
        self.playing = false;
        self.log.record(RendererCall::Stop(self.slot));
    }

    fn seek(&mut self, _progress: f64) {
        self.log.record(RendererCall::Seek(self.slot));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn destroy(&mut self) {
        self.log.record(RendererCall::Destroy(self.slot));
    }
}

pub struct RecordingRendererFactory {
    pub log: Arc<RendererLog>,
}

impl RendererFactory for RecordingRendererFactory {
    fn create(&self, slot: MediaSlot, on_finish: FinishNotifier) -> Box<dyn WaveformRenderer> {
        self.log.record(RendererCall::Create(slot));
        self.log.notifiers.lock().unwrap().push(on_finish);
        Box::new(RecordingRenderer {
            slot,
            playing: false,
            log: Arc::clone(&self.log),
        })
    }
}

// ========================================
// Controller setup
// ========================================

pub struct Harness {
    pub controller: Arc<WorkflowController>,
    pub service: Arc<MockAnalysisService>,
    pub renderers: Arc<RendererLog>,
    pub event_bus: EventBus,
}

pub fn harness_with(service: MockAnalysisService) -> Harness {
    let service = Arc::new(service);
    let renderers = Arc::new(RendererLog::default());
    let event_bus = EventBus::new(100);
    let controller = WorkflowController::new(
        Arc::clone(&service) as Arc<dyn AnalysisService>,
        Arc::new(RecordingRendererFactory {
            log: Arc::clone(&renderers),
        }),
        event_bus.clone(),
    );

    Harness {
        controller: Arc::new(controller),
        service,
        renderers,
        event_bus,
    }
}

pub fn harness() -> Harness {
    harness_with(MockAnalysisService::new())
}

/// Select song.wav + `instrument` and run a successful submit
pub async fn submitted(harness: &Harness, instrument: Instrument) {
    harness.service.push_analyze(Ok(analysis_ok(&["C", "G", "Am", "F"])));
    harness.controller.select_file(song_wav()).await.unwrap();
    harness
        .controller
        .select_instrument(Some(instrument))
        .await
        .unwrap();
    harness.controller.submit().await.unwrap();
}
