//! Error types for hrs-ui
//!
//! Every failure is caught at the workflow controller and flattened into the
//! single user-visible error string; these types exist so callers and tests
//! can still tell the classes apart.

use crate::services::TransportFailure;
use thiserror::Error;

/// Missing user input at submit time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing audio file: please upload an audio file and select an instrument.")]
    MissingFile,

    #[error("Missing instrument: please upload an audio file and select an instrument.")]
    MissingInstrument,
}

/// Regenerate requested before it can work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("No tonal features to regenerate from: submit a recording first.")]
    NoTonalFeatures,

    #[error("Missing instrument: select an instrument before regenerating.")]
    MissingInstrument,
}

/// Workflow controller error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Submit without file or instrument (no network call made)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Regenerate without prior analysis (no network call made)
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A submit or regenerate is already in flight
    #[error("A request is already in progress")]
    Busy,

    /// The Analysis Service call failed
    #[error(transparent)]
    Transport(#[from] TransportFailure),
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
