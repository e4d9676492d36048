//! Pad voice - soft, sustained "water droplet" texture.
//!
//! The pad is what notes and chords sound with. It should sit behind
//! everything else, so it is built from the gentlest shapes there are.
//!
//! # How It Works
//!
//! 1. A sine at the note frequency carries the pitch
//! 2. A quieter triangle, detuned a few cents, adds a slow shimmer
//! 3. Short linear attack so chords bloom instead of clicking in
//! 4. Exponential release, after which the voice reports itself silent
//! 5. Equal-power pan so chord spreads keep their loudness
//!
//! # Variations
//!
//! - More detune (15+ cents) = wider, more chorused
//! - Less detune (2 cents) = glassy, almost static
//! - Longer attack = swells, good under a gated bus

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    automation::{AudioParam, ParamTimeline},
    dsp::{
        mix::equal_power_pan,
        oscillator::{Oscillator, OscillatorWaveform},
    },
    graph::{BusId, RenderCtx},
    synth::{validate_frequency, Voice, VoiceEnvelope, VoiceError, VoiceFactory, VoiceState},
    MAX_BLOCK_SIZE,
};

/// Glide applied to pitch bends.
const BEND_GLIDE: f64 = 0.005;

/// Share of the detuned triangle in the mix.
const SHIMMER: f32 = 0.35;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadSettings {
    /// Seconds from silence to full level
    pub attack: f64,
    /// Seconds from stop to silence
    pub release: f64,
    /// Detune of the shimmer layer, in cents
    pub detune_cents: f32,
    /// Level used until the registry overrides it
    pub level: f32,
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            attack: 0.02,
            release: 0.6,
            detune_cents: 7.0,
            level: 0.2,
        }
    }
}

pub struct PadVoice {
    base_frequency: f32,
    frequency: ParamTimeline,
    envelope: VoiceEnvelope,
    carrier: Oscillator,
    shimmer: Oscillator,
    detune_ratio: f32,
    pan: (f32, f32),
    bus: BusId,
    gain_buffer: Vec<f32>,
    frequency_buffer: Vec<f32>,
}

impl PadVoice {
    pub fn new(frequency: f32, bus: BusId, settings: &PadSettings) -> Self {
        Self {
            base_frequency: frequency,
            frequency: ParamTimeline::new(frequency),
            envelope: VoiceEnvelope::new(settings.level, settings.attack, settings.release),
            carrier: Oscillator::sine(),
            shimmer: Oscillator::new(OscillatorWaveform::Triangle).with_phase(0.25),
            detune_ratio: 2.0_f32.powf(settings.detune_cents / 1200.0),
            pan: equal_power_pan(0.0),
            bus,
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frequency_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn envelope(&self) -> &VoiceEnvelope {
        &self.envelope
    }

    /// Pitch at `time`, after any bends.
    pub fn frequency_at(&self, time: f64) -> f32 {
        self.frequency.value_at(time)
    }
}

impl Voice for PadVoice {
    fn start(&mut self, now: f64) {
        self.envelope.start(now);
    }

    fn stop(&mut self, now: f64) {
        self.envelope.stop(now);
    }

    fn update_pitch(&mut self, multiplier: f32, now: f64) {
        let current = self.frequency.value_at(now);
        self.frequency.cancel_scheduled_values(now);
        self.frequency.set_value_at_time(current, now);
        self.frequency
            .linear_ramp_to_value_at_time(self.base_frequency * multiplier, now + BEND_GLIDE);
    }

    fn base_frequency(&self) -> Option<f32> {
        Some(self.base_frequency)
    }

    fn set_level(&mut self, level: f32, now: f64) {
        self.envelope.set_level(level, now);
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = equal_power_pan(pan);
    }

    fn state(&self) -> VoiceState {
        self.envelope.state()
    }

    fn is_sounding(&self, now: f64) -> bool {
        self.envelope.is_sounding(now)
    }

    fn bus(&self) -> BusId {
        self.bus
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx) {
        if matches!(self.envelope.state(), VoiceState::Pending | VoiceState::Finished) {
            return;
        }
        let frames = left.len().min(right.len()).min(MAX_BLOCK_SIZE);
        let gain = &mut self.gain_buffer[..frames];
        let frequency = &mut self.frequency_buffer[..frames];
        self.envelope.render(gain, ctx);
        self.frequency.render_block(frequency, ctx.time, ctx.sample_rate);

        let (pan_left, pan_right) = self.pan;
        for i in 0..frames {
            let f = frequency[i];
            let body = self.carrier.next_sample(f, ctx.sample_rate);
            let shine = self.shimmer.next_sample(f * self.detune_ratio, ctx.sample_rate);
            let sample = ((1.0 - SHIMMER) * body + SHIMMER * shine) * gain[i];
            left[i] += sample * pan_left;
            right[i] += sample * pan_right;
        }
    }
}

/// Makes pad voices for one bus.
#[derive(Debug, Clone)]
pub struct PadFactory {
    bus: BusId,
    sample_rate: f32,
    settings: PadSettings,
}

impl PadFactory {
    pub fn new(bus: BusId, sample_rate: f32, settings: PadSettings) -> Self {
        Self {
            bus,
            sample_rate,
            settings,
        }
    }

    pub fn bus(&self) -> BusId {
        self.bus
    }
}

impl VoiceFactory for PadFactory {
    fn create_voice(&self, frequency: f32) -> Result<Box<dyn Voice>, VoiceError> {
        let frequency = validate_frequency(frequency, self.sample_rate)?;
        Ok(Box::new(PadVoice::new(frequency, self.bus, &self.settings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn render(voice: &mut dyn Voice, time: f64, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        voice.render(&mut left, &mut right, &RenderCtx::new(SR, time));
        (left, right)
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn silent_until_started() {
        let mut voice = PadVoice::new(440.0, BusId::Melodic, &PadSettings::default());
        let (left, _) = render(&mut voice, 0.0, 256);
        assert_eq!(peak(&left), 0.0);
    }

    #[test]
    fn sounds_then_releases() {
        let settings = PadSettings {
            attack: 0.0,
            release: 0.05,
            ..PadSettings::default()
        };
        let mut voice = PadVoice::new(440.0, BusId::Melodic, &settings);
        voice.start(0.0);
        let (left, right) = render(&mut voice, 0.0, 1024);
        assert!(peak(&left) > 0.05);
        assert!(peak(&left) <= settings.level);
        assert!((peak(&left) - peak(&right)).abs() < 0.01);

        voice.stop(0.1);
        assert!(voice.is_sounding(0.12));
        let (left, _) = render(&mut voice, 0.2, 1024);
        assert_eq!(peak(&left), 0.0);
        assert_eq!(voice.state(), VoiceState::Finished);
        assert!(!voice.is_sounding(0.2));
    }

    #[test]
    fn hard_pan_keeps_one_side_silent() {
        let mut voice = PadVoice::new(220.0, BusId::Melodic, &PadSettings::default());
        voice.set_pan(-1.0);
        voice.start(0.0);
        let (left, right) = render(&mut voice, 0.0, 2048);
        assert!(peak(&left) > 0.0);
        assert!(peak(&right) < 1e-6);
    }

    #[test]
    fn bends_relative_to_base_frequency() {
        let mut voice = PadVoice::new(200.0, BusId::Melodic, &PadSettings::default());
        voice.start(0.0);
        voice.update_pitch(1.5, 1.0);
        voice.update_pitch(0.5, 2.0);
        assert_eq!(voice.base_frequency(), Some(200.0));
        assert!((voice.frequency_at(1.5) - 300.0).abs() < 1e-3);
        assert!((voice.frequency_at(2.5) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn factory_validates_and_routes() {
        let factory = PadFactory::new(BusId::Gate, SR, PadSettings::default());
        let voice = factory.create_voice(330.0).unwrap();
        assert_eq!(voice.bus(), BusId::Gate);
        assert!(factory.create_voice(-1.0).is_err());
        assert!(matches!(
            factory.create_voice(SR),
            Err(VoiceError::AboveNyquist { .. })
        ));
    }
}
