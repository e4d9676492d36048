#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

/*
Phase-Accumulator Oscillator
============================

  phase       Position within one cycle, 0.0 to 1.0.

  increment   How far phase moves per sample:  frequency / sample_rate

Each sample we read the waveform at the current phase, then advance and wrap:

    out = shape(phase)
    phase = (phase + frequency / sample_rate) mod 1.0

Frequency is read every sample, so pitch bends and glides are just a
changing frequency input; the phase stays continuous and nothing clicks.

Shapes kept here are the soft ones the pads and sub bass use:

  sine       sin(2π · phase)
  triangle   4 · |phase - 0.5| - 1     (odd harmonics, falling 1/n²)
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Triangle,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    /// Start at a given phase (0..1) so layered oscillators don't line up.
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase.rem_euclid(1.0);
        self
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = match self.waveform {
            OscillatorWaveform::Sine => (TAU * self.phase).sin(),
            OscillatorWaveform::Triangle => 4.0 * (self.phase - 0.5).abs() - 1.0,
        };
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let frequency = 440.0;
        let mut osc = Oscillator::sine();

        let buffer: Vec<f32> = (0..128).map(|_| osc.next_sample(frequency, sample_rate)).collect();

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * frequency * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn triangle_spans_unit_range() {
        let mut osc = Oscillator::triangle();
        let samples: Vec<f32> = (0..100).map(|_| osc.next_sample(10.0, 1_000.0)).collect();
        let max = samples.iter().copied().fold(f32::MIN, f32::max);
        let min = samples.iter().copied().fold(f32::MAX, f32::min);
        assert!((max - 1.0).abs() < 1e-4);
        assert!((min + 1.0).abs() < 1e-4);
    }

    #[test]
    fn phase_wraps() {
        let mut osc = Oscillator::sine().with_phase(1.25);
        for _ in 0..1_000 {
            let s = osc.next_sample(12_345.0, 48_000.0);
            assert!(s.abs() <= 1.0 + 1e-6);
        }
    }
}
