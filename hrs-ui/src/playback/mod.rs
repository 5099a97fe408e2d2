//! Waveform player management
//!
//! - `renderer`: the seam to a waveform renderer implementation
//! - `registry`: owns the per-slot playback handles and their labels
//! - `headless`: a renderer with no output, for the CLI driver

pub mod headless;
pub mod registry;
pub mod renderer;

pub use headless::{HeadlessRenderer, HeadlessRendererFactory};
pub use registry::{BindOutcome, PlayerRegistry};
pub use renderer::{FinishEvent, FinishNotifier, RendererFactory, WaveformRenderer};
