//! Presentation snapshot of the workflow
//!
//! Plain data derived from controller state; a UI renders this and nothing else.

use crate::playback::PlayerRegistry;
use crate::state::WorkflowState;
use hrs_common::events::WorkflowStatus;
use hrs_common::{Instrument, MediaSlot};
use serde::Serialize;

pub const SUBMIT_LABEL: &str = "Submit for Recommendation";
pub const SUBMITTING_LABEL: &str = "Processing...";
pub const REGENERATE_LABEL: &str = "Regenerate Harmony";
pub const REGENERATING_LABEL: &str = "Regenerating...";

/// One player's row in the view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportView {
    pub slot: MediaSlot,
    pub url: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowView {
    pub status: WorkflowStatus,
    pub inputs_enabled: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub regenerate_enabled: bool,
    pub regenerate_label: &'static str,
    pub selected_file: Option<String>,
    pub selected_instrument: Option<Instrument>,
    pub error: Option<String>,
    pub tonal_features_pretty: Option<String>,
    pub chords: Vec<String>,
    pub progression_display: String,
    pub download_url: Option<String>,
    /// Bound players only, in slot order
    pub players: Vec<TransportView>,
}

impl WorkflowView {
    pub(crate) fn build(state: &WorkflowState, players: &PlayerRegistry) -> Self {
        let busy = state.status.is_busy();
        let recommendation = state.recommendation.as_ref();

        let players = MediaSlot::ALL
            .iter()
            .filter_map(|&slot| {
                Some(TransportView {
                    slot,
                    url: players.bound_url(slot)?.to_string(),
                    label: players.label(slot)?,
                })
            })
            .collect();

        Self {
            status: state.status,
            inputs_enabled: !busy,
            submit_enabled: !busy,
            submit_label: if state.status == WorkflowStatus::Submitting {
                SUBMITTING_LABEL
            } else {
                SUBMIT_LABEL
            },
            regenerate_enabled: !busy && state.tonal_features.is_some(),
            regenerate_label: if state.status == WorkflowStatus::Regenerating {
                REGENERATING_LABEL
            } else {
                REGENERATE_LABEL
            },
            selected_file: state.selection.file.as_ref().map(|f| f.file_name.clone()),
            selected_instrument: state.selection.instrument,
            error: state.error.clone(),
            tonal_features_pretty: state.tonal_features.as_ref().map(|f| f.to_pretty_json()),
            chords: recommendation.map(|r| r.chords.clone()).unwrap_or_default(),
            progression_display: recommendation
                .map(|r| r.progression_display())
                .unwrap_or_default(),
            download_url: state.media.combined_url.clone(),
            players,
        }
    }
}
