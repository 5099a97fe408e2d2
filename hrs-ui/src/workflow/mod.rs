//! Upload/analyze/regenerate workflow
//!
//! State machine (reentrant, no terminal state):
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok──▶ Ready ──regenerate──▶ Regenerating ──ok──▶ Ready
//!                       │                                        │
//!                       └──err──▶ Error ◀──────────err───────────┘
//! ```
//!
//! Ready and Error accept a new submit; regenerate is accepted from either as
//! long as tonal features exist. While Submitting or Regenerating, both
//! actions are rejected up front, so two responses can never race.

pub mod controller;
pub mod view;

pub use controller::WorkflowController;
pub use view::{TransportView, WorkflowView};
