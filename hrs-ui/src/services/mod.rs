//! External service clients

pub mod analysis_client;

pub use analysis_client::{
    AnalysisClient, AnalysisResult, AnalysisService, HarmonyResult, TransportFailure,
};
