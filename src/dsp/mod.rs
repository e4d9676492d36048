//! Low-level DSP primitives used by the voices and the bus graph.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs.

/// Summing, gain curves and equal-power panning.
pub mod mix;
/// Phase-accumulator oscillators.
pub mod oscillator;

pub use oscillator::{Oscillator, OscillatorWaveform};
