//! Workflow controller
//!
//! Owns the user-visible state and drives the two-phase protocol against the
//! Analysis Service. State sits behind a tokio `RwLock`; the lock is released
//! while a request is outstanding so the busy status stays observable, and is
//! held again from applying a response through rebinding the players, so the
//! registry only ever sees a complete `MediaUrls`.
//!
//! Lock order is always state, then players.
//!
//! A request future dropped before its response is applied (timeout, aborted
//! task) still leaves the workflow retryable: an [`InFlight`] guard moves the
//! status from busy to `Error` with the operation's fallback message.

use crate::error::{PreconditionError, ValidationError, WorkflowError, WorkflowResult};
use crate::playback::{PlayerRegistry, RendererFactory};
use crate::services::analysis_client::{ANALYZE_FALLBACK_MESSAGE, REGENERATE_FALLBACK_MESSAGE};
use crate::services::AnalysisService;
use crate::state::{AudioUpload, MediaUrls, Recommendation, UploadSelection, WorkflowState};
use crate::workflow::view::WorkflowView;
use hrs_common::api::TonalFeatures;
use hrs_common::events::{EventBus, WorkflowEvent, WorkflowStatus};
use hrs_common::{Instrument, MediaSlot};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

pub struct WorkflowController {
    service: Arc<dyn AnalysisService>,
    state: Arc<RwLock<WorkflowState>>,
    players: Mutex<PlayerRegistry>,
    event_bus: EventBus,
}

impl WorkflowController {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        renderers: Arc<dyn RendererFactory>,
        event_bus: EventBus,
    ) -> Self {
        let players = PlayerRegistry::new(renderers).with_event_bus(event_bus.clone());
        Self {
            service,
            state: Arc::new(RwLock::new(WorkflowState::default())),
            players: Mutex::new(players),
            event_bus,
        }
    }

    // ========================================
    // Selection
    // ========================================

    /// Choose the audio file to upload; clears any displayed error
    pub async fn select_file(&self, upload: AudioUpload) -> WorkflowResult<()> {
        let mut state = self.state.write().await;
        if state.status.is_busy() {
            return Err(WorkflowError::Busy);
        }
        debug!(file = %upload.file_name, mime = %upload.mime_type, "Audio file selected");
        state.selection.file = Some(Arc::new(upload));
        state.error = None;
        Ok(())
    }

    /// Choose (or clear) the target instrument
    pub async fn select_instrument(&self, instrument: Option<Instrument>) -> WorkflowResult<()> {
        let mut state = self.state.write().await;
        if state.status.is_busy() {
            return Err(WorkflowError::Busy);
        }
        debug!(instrument = ?instrument, "Instrument selected");
        state.selection.instrument = instrument;
        Ok(())
    }

    // ========================================
    // Actions
    // ========================================

    /// Upload the selected file for analysis
    ///
    /// Without a file or instrument this fails locally with a validation error
    /// and never touches the network. On a transport failure, results of any
    /// earlier successful run are kept.
    pub async fn submit(&self) -> WorkflowResult<()> {
        let (upload, instrument) = {
            let mut state = self.state.write().await;
            if state.status.is_busy() {
                debug!(status = %state.status, "Submit rejected: request in flight");
                return Err(WorkflowError::Busy);
            }

            let Some(upload) = state.selection.file.clone() else {
                return Err(self.fail_locally(&mut state, ValidationError::MissingFile.into()));
            };
            let Some(instrument) = state.selection.instrument else {
                return Err(self.fail_locally(&mut state, ValidationError::MissingInstrument.into()));
            };

            state.error = None;
            self.transition(&mut state, WorkflowStatus::Submitting);
            (upload, instrument)
        };

        info!(file = %upload.file_name, instrument = %instrument, "Submitting for recommendation");
        let in_flight = self.in_flight(ANALYZE_FALLBACK_MESSAGE);
        let result = self.service.analyze(&upload, instrument).await;

        let mut state = self.state.write().await;
        in_flight.complete();
        match result {
            Ok(analysis) => {
                state.tonal_features = Some(analysis.tonal_features);
                state.recommendation = Some(Recommendation {
                    chords: analysis.chords,
                    progression: analysis.progression,
                    preview_url: analysis.preview_url.clone(),
                });
                state.media = MediaUrls {
                    uploaded_audio_url: analysis.uploaded_audio_url,
                    preview_url: analysis.preview_url,
                    combined_url: analysis.combined_url,
                };
                self.transition(&mut state, WorkflowStatus::Ready);
                self.rebind_players(&state).await;
                Ok(())
            }
            Err(failure) => {
                warn!(error = %failure, "Recommendation failed");
                state.error = Some(failure.message.clone());
                self.transition(&mut state, WorkflowStatus::Error);
                Err(failure.into())
            }
        }
    }

    /// Request a new harmony from the stored tonal features
    ///
    /// Only the recommendation and the preview/combined media change; the
    /// uploaded audio URL and the tonal features are left as they are.
    pub async fn regenerate(&self) -> WorkflowResult<()> {
        let (instrument, features) = {
            let mut state = self.state.write().await;
            if state.status.is_busy() {
                debug!(status = %state.status, "Regenerate rejected: request in flight");
                return Err(WorkflowError::Busy);
            }

            let Some(features) = state.tonal_features.clone() else {
                return Err(self.fail_locally(&mut state, PreconditionError::NoTonalFeatures.into()));
            };
            let Some(instrument) = state.selection.instrument else {
                return Err(
                    self.fail_locally(&mut state, PreconditionError::MissingInstrument.into())
                );
            };

            state.error = None;
            self.transition(&mut state, WorkflowStatus::Regenerating);
            (instrument, features)
        };

        info!(instrument = %instrument, "Regenerating harmony");
        let in_flight = self.in_flight(REGENERATE_FALLBACK_MESSAGE);
        let result = self.service.regenerate_harmony(instrument, &features).await;

        let mut state = self.state.write().await;
        in_flight.complete();
        match result {
            Ok(harmony) => {
                state.recommendation = Some(Recommendation {
                    chords: harmony.chords,
                    progression: harmony.progression,
                    preview_url: harmony.preview_url.clone(),
                });
                state.media.preview_url = harmony.preview_url;
                state.media.combined_url = harmony.combined_url;
                self.transition(&mut state, WorkflowStatus::Ready);
                self.rebind_players(&state).await;
                Ok(())
            }
            Err(failure) => {
                warn!(error = %failure, "Harmony regeneration failed");
                state.error = Some(failure.message.clone());
                self.transition(&mut state, WorkflowStatus::Error);
                Err(failure.into())
            }
        }
    }

    // ========================================
    // Player transport
    // ========================================

    pub async fn toggle_playback(&self, slot: MediaSlot) {
        self.players.lock().await.toggle_playback(slot);
    }

    pub async fn replay(&self, slot: MediaSlot) {
        self.players.lock().await.replay(slot);
    }

    pub async fn seek(&self, slot: MediaSlot, progress: f64) {
        self.players.lock().await.seek(slot, progress);
    }

    /// Apply renderer finish notifications received since the last call
    pub async fn pump_finished(&self) -> usize {
        self.players.lock().await.pump_finished()
    }

    // ========================================
    // Observation
    // ========================================

    pub async fn status(&self) -> WorkflowStatus {
        self.state.read().await.status
    }

    pub async fn is_busy(&self) -> bool {
        self.state.read().await.status.is_busy()
    }

    pub async fn error_message(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn selection(&self) -> UploadSelection {
        self.state.read().await.selection.clone()
    }

    pub async fn tonal_features(&self) -> Option<TonalFeatures> {
        self.state.read().await.tonal_features.clone()
    }

    pub async fn recommendation(&self) -> Option<Recommendation> {
        self.state.read().await.recommendation.clone()
    }

    pub async fn media_urls(&self) -> MediaUrls {
        self.state.read().await.media.clone()
    }

    /// Transport label of a slot, None if no player is bound there
    pub async fn transport_label(&self, slot: MediaSlot) -> Option<&'static str> {
        self.players.lock().await.label(slot)
    }

    /// Consistent snapshot for rendering
    pub async fn view(&self) -> WorkflowView {
        let state = self.state.read().await;
        let players = self.players.lock().await;
        WorkflowView::build(&state, &players)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_bus.subscribe()
    }

    // ========================================
    // Internals
    // ========================================

    fn transition(&self, state: &mut WorkflowState, new_status: WorkflowStatus) {
        transition(state, &self.event_bus, new_status);
    }

    fn in_flight(&self, fallback: &'static str) -> InFlight<'_> {
        InFlight {
            state: &self.state,
            event_bus: &self.event_bus,
            fallback,
            completed: false,
        }
    }

    /// Record a local (no network) failure and hand the error back
    fn fail_locally(
        &self,
        state: &mut WorkflowState,
        error: WorkflowError,
    ) -> WorkflowError {
        warn!(error = %error, "Request not sent");
        state.error = Some(error.to_string());
        self.transition(state, WorkflowStatus::Error);
        error
    }

    async fn rebind_players(&self, state: &WorkflowState) {
        let mut players = self.players.lock().await;
        players.sync(&state.media);
    }
}

fn transition(state: &mut WorkflowState, event_bus: &EventBus, new_status: WorkflowStatus) {
    let old_status = state.status;
    state.status = new_status;
    debug!(from = %old_status, to = %new_status, "Workflow status changed");
    event_bus.emit_lossy(WorkflowEvent::StatusChanged {
        old_status,
        new_status,
        timestamp: chrono::Utc::now(),
    });
}

/// Busy-status guard for one outstanding request
///
/// Armed while the service call is pending. Dropped without
/// [`InFlight::complete`], it releases the busy status so the user can retry.
struct InFlight<'a> {
    state: &'a Arc<RwLock<WorkflowState>>,
    event_bus: &'a EventBus,
    fallback: &'static str,
    completed: bool,
}

impl InFlight<'_> {
    /// The response is being applied under the state lock
    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!("Request abandoned before its response was applied");

        match self.state.try_write() {
            Ok(mut state) => abandon(&mut state, self.event_bus, self.fallback),
            Err(_) => {
                // Lock is contended; finish the reset once it frees up
                let state = Arc::clone(self.state);
                let event_bus = self.event_bus.clone();
                let fallback = self.fallback;
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let mut state = state.write().await;
                            abandon(&mut state, &event_bus, fallback);
                        });
                    }
                    Err(_) => warn!("No runtime to release busy status"),
                }
            }
        }
    }
}

fn abandon(state: &mut WorkflowState, event_bus: &EventBus, fallback: &str) {
    if state.status.is_busy() {
        state.error = Some(fallback.to_string());
        transition(state, event_bus, WorkflowStatus::Error);
    }
}
