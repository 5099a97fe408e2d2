//! Player registry
//!
//! Owns zero to three playback handles, one per [`MediaSlot`]. A handle is
//! created the first time its slot gets a URL and is destroyed before any new
//! URL is bound, so a renderer never holds a stale media reference.
//!
//! Finish notifications arrive over a channel and are applied by
//! [`PlayerRegistry::pump_finished`]. Each notification carries the handle id
//! it was issued for; ones from destroyed handles are ignored.

use super::renderer::{FinishEvent, FinishNotifier, RendererFactory, WaveformRenderer};
use crate::state::MediaUrls;
use hrs_common::events::{EventBus, WorkflowEvent};
use hrs_common::MediaSlot;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// One bound renderer plus its transport label
struct PlaybackHandle {
    id: Uuid,
    url: String,
    label: &'static str,
    renderer: Box<dyn WaveformRenderer>,
}

impl PlaybackHandle {
    fn destroy(mut self) {
        self.renderer.destroy();
    }
}

/// Result of a [`PlayerRegistry::bind`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// Same URL already bound (or slot already empty)
    Unchanged,
    /// A new renderer was created with this handle id
    Bound(Uuid),
    /// The slot's handle was destroyed and the slot is now empty
    Cleared,
}

/// Registry of waveform players keyed by slot
pub struct PlayerRegistry {
    factory: Arc<dyn RendererFactory>,
    handles: BTreeMap<MediaSlot, PlaybackHandle>,
    finish_tx: mpsc::UnboundedSender<FinishEvent>,
    finish_rx: mpsc::UnboundedReceiver<FinishEvent>,
    event_bus: Option<EventBus>,
}

impl PlayerRegistry {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        let (finish_tx, finish_rx) = mpsc::unbounded_channel();
        Self {
            factory,
            handles: BTreeMap::new(),
            finish_tx,
            finish_rx,
            event_bus: None,
        }
    }

    /// Emit `MediaRebound` events on this bus
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Bind `slot` to `url`
    ///
    /// - `None`: destroy any handle, leave the slot empty
    /// - same URL as bound: no-op
    /// - different URL: destroy the old handle first, then create and load a
    ///   new renderer; the label resets to the slot's idle word
    pub fn bind(&mut self, slot: MediaSlot, url: Option<&str>) -> BindOutcome {
        let current = self.handles.get(&slot).map(|h| h.url.as_str());
        if current == url {
            return BindOutcome::Unchanged;
        }

        if let Some(old) = self.handles.remove(&slot) {
            debug!(slot = %slot, handle = %old.id, url = %old.url, "Destroying player");
            old.destroy();
        }

        let Some(url) = url else {
            info!(slot = %slot, "Player slot cleared");
            self.emit_rebound(slot, None, None);
            return BindOutcome::Cleared;
        };

        let id = Uuid::new_v4();
        let notifier = FinishNotifier::new(slot, id, self.finish_tx.clone());
        let mut renderer = self.factory.create(slot, notifier);
        renderer.load(url);

        info!(slot = %slot, handle = %id, url = %url, "Player bound");

        self.handles.insert(
            slot,
            PlaybackHandle {
                id,
                url: url.to_string(),
                label: slot.idle_label(),
                renderer,
            },
        );
        self.emit_rebound(slot, Some(id), Some(url));

        BindOutcome::Bound(id)
    }

    /// Rebind every slot whose URL differs from `media`
    pub fn sync(&mut self, media: &MediaUrls) -> Vec<(MediaSlot, BindOutcome)> {
        MediaSlot::ALL
            .iter()
            .map(|&slot| (slot, self.bind(slot, media.get(slot))))
            .collect()
    }

    /// Toggle play/pause; no-op on an empty slot
    pub fn toggle_playback(&mut self, slot: MediaSlot) {
        if let Some(handle) = self.handles.get_mut(&slot) {
            handle.renderer.play_pause();
            handle.label = if handle.renderer.is_playing() {
                slot.active_label()
            } else {
                slot.idle_label()
            };
            debug!(slot = %slot, label = handle.label, "Playback toggled");
        }
    }

    /// Restart from the beginning; no-op on an empty slot
    pub fn replay(&mut self, slot: MediaSlot) {
        if let Some(handle) = self.handles.get_mut(&slot) {
            handle.renderer.stop();
            handle.renderer.play();
            handle.label = slot.active_label();
            debug!(slot = %slot, "Playback restarted");
        }
    }

    /// Seek to a fraction of the duration; no-op on an empty slot
    pub fn seek(&mut self, slot: MediaSlot, progress: f64) {
        if let Some(handle) = self.handles.get_mut(&slot) {
            handle.renderer.seek(progress.clamp(0.0, 1.0));
        }
    }

    /// Playback of `slot` finished: reset its label
    pub fn on_finish(&mut self, slot: MediaSlot) {
        if let Some(handle) = self.handles.get_mut(&slot) {
            handle.label = slot.idle_label();
            debug!(slot = %slot, "Playback finished");
        }
    }

    /// Apply pending finish notifications, returning how many were applied
    pub fn pump_finished(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.finish_rx.try_recv() {
            let current = self.handles.get(&event.slot).map(|h| h.id);
            if current == Some(event.handle_id) {
                self.on_finish(event.slot);
                applied += 1;
            } else {
                debug!(slot = %event.slot, handle = %event.handle_id, "Ignoring finish from stale player");
            }
        }
        applied
    }

    pub fn is_bound(&self, slot: MediaSlot) -> bool {
        self.handles.contains_key(&slot)
    }

    pub fn bound_url(&self, slot: MediaSlot) -> Option<&str> {
        self.handles.get(&slot).map(|h| h.url.as_str())
    }

    pub fn handle_id(&self, slot: MediaSlot) -> Option<Uuid> {
        self.handles.get(&slot).map(|h| h.id)
    }

    /// Transport label, None for an empty slot
    pub fn label(&self, slot: MediaSlot) -> Option<&'static str> {
        self.handles.get(&slot).map(|h| h.label)
    }

    pub fn bound_count(&self) -> usize {
        self.handles.len()
    }

    fn emit_rebound(&self, slot: MediaSlot, handle_id: Option<Uuid>, url: Option<&str>) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(WorkflowEvent::MediaRebound {
                slot,
                handle_id,
                url: url.map(str::to_string),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Drop for PlayerRegistry {
    fn drop(&mut self) {
        for (_, handle) in std::mem::take(&mut self.handles) {
            handle.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(MediaSlot),
        Load(MediaSlot, String),
        Destroy(MediaSlot),
        PlayPause(MediaSlot),
        Play(MediaSlot),
        Stop(MediaSlot),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        notifiers: Mutex<Vec<FinishNotifier>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, wanted: &Call) -> usize {
            self.calls().iter().filter(|c| *c == wanted).count()
        }
    }

    struct FakeRenderer {
        slot: MediaSlot,
        playing: bool,
        recorder: Arc<Recorder>,
    }

    impl FakeRenderer {
        fn record(&self, call: Call) {
            self.recorder.calls.lock().unwrap().push(call);
        }
    }

    impl WaveformRenderer for FakeRenderer {
        fn load(&mut self, url: &str) {
            self.record(Call::Load(self.slot, url.to_string()));
        }
        fn play_pause(&mut self) {
            self.playing = !self.playing;
            self.record(Call::PlayPause(self.slot));
        }
        fn play(&mut self) {
            self.playing = true;
            self.record(Call::Play(self.slot));
        }
        fn stop(&mut self) {
            self.playing = false;
            self.record(Call::Stop(self.slot));
        }
        fn seek(&mut self, _progress: f64) {}
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn destroy(&mut self) {
            self.record(Call::Destroy(self.slot));
        }
    }

    struct FakeFactory(Arc<Recorder>);

    impl RendererFactory for FakeFactory {
        fn create(&self, slot: MediaSlot, on_finish: FinishNotifier) -> Box<dyn WaveformRenderer> {
            self.0.calls.lock().unwrap().push(Call::Create(slot));
            self.0.notifiers.lock().unwrap().push(on_finish);
            Box::new(FakeRenderer {
                slot,
                playing: false,
                recorder: Arc::clone(&self.0),
            })
        }
    }

    fn registry() -> (PlayerRegistry, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let registry = PlayerRegistry::new(Arc::new(FakeFactory(Arc::clone(&recorder))));
        (registry, recorder)
    }

    #[test]
    fn test_bind_same_url_is_idempotent() {
        let (mut players, recorder) = registry();

        assert!(matches!(players.bind(MediaSlot::Preview, Some("urlX")), BindOutcome::Bound(_)));
        assert_eq!(players.bind(MediaSlot::Preview, Some("urlX")), BindOutcome::Unchanged);

        assert_eq!(recorder.count(&Call::Create(MediaSlot::Preview)), 1);
        assert_eq!(recorder.count(&Call::Load(MediaSlot::Preview, "urlX".into())), 1);
    }

    #[test]
    fn test_rebind_destroys_before_create() {
        let (mut players, recorder) = registry();

        players.bind(MediaSlot::Preview, Some("urlX"));
        players.toggle_playback(MediaSlot::Preview);
        assert_eq!(players.label(MediaSlot::Preview), Some("Pause"));

        players.bind(MediaSlot::Preview, Some("urlY"));

        assert_eq!(
            recorder.calls(),
            vec![
                Call::Create(MediaSlot::Preview),
                Call::Load(MediaSlot::Preview, "urlX".into()),
                Call::PlayPause(MediaSlot::Preview),
                Call::Destroy(MediaSlot::Preview),
                Call::Create(MediaSlot::Preview),
                Call::Load(MediaSlot::Preview, "urlY".into()),
            ]
        );
        assert_eq!(players.label(MediaSlot::Preview), Some("Play"));
        assert_eq!(players.bound_url(MediaSlot::Preview), Some("urlY"));
    }

    #[test]
    fn test_bind_none_clears_slot() {
        let (mut players, recorder) = registry();

        players.bind(MediaSlot::Combined, Some("mix"));
        assert_eq!(players.bind(MediaSlot::Combined, None), BindOutcome::Cleared);
        assert!(!players.is_bound(MediaSlot::Combined));
        assert_eq!(players.label(MediaSlot::Combined), None);
        assert_eq!(recorder.count(&Call::Destroy(MediaSlot::Combined)), 1);

        // Already empty
        assert_eq!(players.bind(MediaSlot::Combined, None), BindOutcome::Unchanged);
    }

    #[test]
    fn test_transport_on_empty_slot_is_noop() {
        let (mut players, recorder) = registry();

        players.toggle_playback(MediaSlot::Upload);
        players.replay(MediaSlot::Upload);
        players.seek(MediaSlot::Upload, 0.5);
        players.on_finish(MediaSlot::Upload);

        assert!(recorder.calls().is_empty());
        assert_eq!(players.label(MediaSlot::Upload), None);
    }

    #[test]
    fn test_toggle_and_replay_labels() {
        let (mut players, _recorder) = registry();
        players.bind(MediaSlot::Combined, Some("mix"));
        assert_eq!(players.label(MediaSlot::Combined), Some("Play Combined"));

        players.toggle_playback(MediaSlot::Combined);
        assert_eq!(players.label(MediaSlot::Combined), Some("Pause Combined"));

        players.toggle_playback(MediaSlot::Combined);
        assert_eq!(players.label(MediaSlot::Combined), Some("Play Combined"));

        players.replay(MediaSlot::Combined);
        assert_eq!(players.label(MediaSlot::Combined), Some("Pause Combined"));
    }

    #[test]
    fn test_replay_stops_then_plays() {
        let (mut players, recorder) = registry();
        players.bind(MediaSlot::Upload, Some("u"));
        players.replay(MediaSlot::Upload);

        let calls = recorder.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[Call::Stop(MediaSlot::Upload), Call::Play(MediaSlot::Upload)]
        );
        assert_eq!(players.label(MediaSlot::Upload), Some("Pause"));
    }

    #[test]
    fn test_finish_notification_resets_label() {
        let (mut players, recorder) = registry();
        players.bind(MediaSlot::Upload, Some("u"));
        players.toggle_playback(MediaSlot::Upload);
        assert_eq!(players.label(MediaSlot::Upload), Some("Pause"));

        recorder.notifiers.lock().unwrap()[0].notify();
        assert_eq!(players.pump_finished(), 1);
        assert_eq!(players.label(MediaSlot::Upload), Some("Play"));
    }

    #[test]
    fn test_stale_finish_is_ignored() {
        let (mut players, recorder) = registry();
        players.bind(MediaSlot::Preview, Some("old"));
        players.bind(MediaSlot::Preview, Some("new"));
        players.toggle_playback(MediaSlot::Preview);

        // Notifier of the destroyed renderer
        recorder.notifiers.lock().unwrap()[0].notify();
        assert_eq!(players.pump_finished(), 0);
        assert_eq!(players.label(MediaSlot::Preview), Some("Pause"));
    }

    #[test]
    fn test_sync_rebinds_only_changed_slots() {
        let (mut players, recorder) = registry();
        let mut media = MediaUrls {
            uploaded_audio_url: Some("u".into()),
            preview_url: Some("p1".into()),
            combined_url: Some("c1".into()),
        };
        players.sync(&media);
        assert_eq!(players.bound_count(), 3);

        media.preview_url = Some("p2".into());
        media.combined_url = None;
        let outcomes = players.sync(&media);

        assert_eq!(outcomes[0], (MediaSlot::Upload, BindOutcome::Unchanged));
        assert!(matches!(outcomes[1], (MediaSlot::Preview, BindOutcome::Bound(_))));
        assert_eq!(outcomes[2], (MediaSlot::Combined, BindOutcome::Cleared));
        assert_eq!(recorder.count(&Call::Create(MediaSlot::Upload)), 1);
    }

    #[test]
    fn test_drop_destroys_all_players() {
        let (mut players, recorder) = registry();
        players.bind(MediaSlot::Upload, Some("u"));
        players.bind(MediaSlot::Preview, Some("p"));
        drop(players);

        assert_eq!(recorder.count(&Call::Destroy(MediaSlot::Upload)), 1);
        assert_eq!(recorder.count(&Call::Destroy(MediaSlot::Preview)), 1);
    }

    #[tokio::test]
    async fn test_rebind_emits_event() {
        let (players, _recorder) = registry();
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let mut players = players.with_event_bus(bus);

        players.bind(MediaSlot::Upload, Some("u"));

        match rx.recv().await.unwrap() {
            WorkflowEvent::MediaRebound { slot, url, handle_id, .. } => {
                assert_eq!(slot, MediaSlot::Upload);
                assert_eq!(url.as_deref(), Some("u"));
                assert_eq!(handle_id, players.handle_id(MediaSlot::Upload));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
