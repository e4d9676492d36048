pub mod automation; // Parameter timelines and the audio clock
pub mod dsp;
pub mod engine; // Timer queue, configuration and the top-level engine
pub mod gate; // Periodic gate and sidechain ducking
pub mod graph; // Fixed bus topology
pub mod io;
pub mod sequencing; // Note values and tempo arithmetic
pub mod synth; // Voice contract and note/chord lifecycle
pub mod theory; // Just-intonation ratios, scales and chords
pub mod voices;

pub use engine::{config::EngineConfig, RippleEngine};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// Lowest gain an exponential ramp is allowed to start from or aim for.
pub const MIN_GAIN: f32 = 0.001;
