//! Headless waveform renderer
//!
//! Tracks transport state without drawing or producing audio. Used by the
//! command-line driver, where there is no display to render into.

use super::renderer::{FinishNotifier, RendererFactory, WaveformRenderer};
use hrs_common::MediaSlot;
use tracing::debug;

pub struct HeadlessRenderer {
    slot: MediaSlot,
    url: Option<String>,
    playing: bool,
    position: f64,
    on_finish: FinishNotifier,
}

impl HeadlessRenderer {
    pub fn new(slot: MediaSlot, on_finish: FinishNotifier) -> Self {
        Self {
            slot,
            url: None,
            playing: false,
            position: 0.0,
            on_finish,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }
}

impl WaveformRenderer for HeadlessRenderer {
    fn load(&mut self, url: &str) {
        debug!(slot = %self.slot, url = %url, "Headless renderer loading");
        self.url = Some(url.to_string());
        self.position = 0.0;
    }

    fn play_pause(&mut self) {
        if self.url.is_some() {
            self.playing = !self.playing;
        }
    }

    fn play(&mut self) {
        if self.url.is_some() {
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    /// Seeking to the end while playing counts as finishing
    fn seek(&mut self, progress: f64) {
        self.position = progress.clamp(0.0, 1.0);
        if self.playing && self.position >= 1.0 {
            self.playing = false;
            self.on_finish.notify();
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn destroy(&mut self) {
        debug!(slot = %self.slot, "Headless renderer destroyed");
        self.playing = false;
        self.url = None;
    }
}

/// Factory producing [`HeadlessRenderer`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessRendererFactory;

impl RendererFactory for HeadlessRendererFactory {
    fn create(&self, slot: MediaSlot, on_finish: FinishNotifier) -> Box<dyn WaveformRenderer> {
        Box::new(HeadlessRenderer::new(slot, on_finish))
    }
}
