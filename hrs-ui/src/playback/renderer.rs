//! Waveform renderer seam
//!
//! A renderer loads one audio URL into a visual waveform and exposes transport
//! controls. Renderers are stateful: once loaded they are never pointed at a
//! second source. The registry destroys and recreates them instead.

use hrs_common::MediaSlot;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport controls of one waveform instance
pub trait WaveformRenderer: Send {
    /// Start loading `url`. Best-effort: an unreachable URL leaves an empty waveform.
    fn load(&mut self, url: &str);

    fn play_pause(&mut self);

    fn play(&mut self);

    /// Stop and rewind to the start
    fn stop(&mut self);

    /// Seek to a fraction of the duration (0.0-1.0)
    fn seek(&mut self, progress: f64);

    fn is_playing(&self) -> bool;

    /// Release the waveform and any listeners. Called exactly once, before drop.
    fn destroy(&mut self);
}

/// Creates renderers for the registry
pub trait RendererFactory: Send + Sync {
    /// Create an unloaded renderer for `slot`
    ///
    /// The renderer must call `on_finish.notify()` when playback reaches the end.
    fn create(&self, slot: MediaSlot, on_finish: FinishNotifier) -> Box<dyn WaveformRenderer>;
}

/// Playback reached the end of the media bound to `handle_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishEvent {
    pub slot: MediaSlot,
    pub handle_id: Uuid,
}

/// Finish subscription installed by the registry at bind time
///
/// Tagged with the handle it was created for, so a notification from a torn
/// down renderer is recognizable and dropped.
#[derive(Debug, Clone)]
pub struct FinishNotifier {
    event: FinishEvent,
    tx: mpsc::UnboundedSender<FinishEvent>,
}

impl FinishNotifier {
    pub(crate) fn new(
        slot: MediaSlot,
        handle_id: Uuid,
        tx: mpsc::UnboundedSender<FinishEvent>,
    ) -> Self {
        Self {
            event: FinishEvent { slot, handle_id },
            tx,
        }
    }

    pub fn slot(&self) -> MediaSlot {
        self.event.slot
    }

    pub fn handle_id(&self) -> Uuid {
        self.event.handle_id
    }

    /// Report that playback finished
    pub fn notify(&self) {
        // Registry gone means nobody is left to relabel
        let _ = self.tx.send(self.event);
    }
}
