//! Analysis Service API types
//!
//! Request/response bodies exchanged with the Analysis Service's
//! `/recommend` and `/regenerate-harmony` endpoints.

pub mod types;

/// Multipart analyze endpoint
pub const RECOMMEND_PATH: &str = "/recommend";

/// JSON regenerate endpoint
pub const REGENERATE_PATH: &str = "/regenerate-harmony";

pub use types::{
    AnalyzeResponse, ErrorResponse, RegenerateRequest, RegenerateResponse, TonalFeatures,
};
