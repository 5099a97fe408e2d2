//! hrs-ui library interface
//!
//! Client-side workflow for the Harmony Recommendation System: upload a
//! recording, pick an instrument, and drive the Analysis Service through the
//! analyze/regenerate cycle while keeping up to three waveform players bound
//! to the returned media.

pub mod error;
pub mod playback;
pub mod services;
pub mod state;
pub mod workflow;

pub use crate::error::{PreconditionError, ValidationError, WorkflowError};
pub use crate::playback::{PlayerRegistry, RendererFactory, WaveformRenderer};
pub use crate::services::{AnalysisClient, AnalysisService, TransportFailure};
pub use crate::state::{AudioUpload, MediaUrls, Recommendation, UploadSelection};
pub use crate::workflow::{WorkflowController, WorkflowView};
