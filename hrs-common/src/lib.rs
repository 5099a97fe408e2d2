//! # HRS Common Library
//!
//! Shared code for the Harmony Recommendation System client including:
//! - Analysis Service request/response types
//! - Instrument and media slot definitions
//! - Event types (WorkflowEvent enum) and EventBus
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod instrument;
pub mod media;

pub use error::{Error, Result};
pub use instrument::Instrument;
pub use media::MediaSlot;
