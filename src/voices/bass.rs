//! Sub bass voice - pure sine an octave under the harmony.
//!
//! Doubled under notes and chords when bass doubling is on. A sub should be
//! felt more than heard, so it has the fewest possible harmonics: none.
//!
//! # How It Works
//!
//! 1. Single sine oscillator, centred
//! 2. Medium attack and release so it never thumps
//! 3. No pitch bend: `base_frequency` is `None`, so the registry skips it

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{mix::equal_power_pan, oscillator::Oscillator},
    graph::{BusId, RenderCtx},
    synth::{validate_frequency, Voice, VoiceEnvelope, VoiceError, VoiceFactory, VoiceState},
    MAX_BLOCK_SIZE,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubBassSettings {
    pub attack: f64,
    pub release: f64,
    pub level: f32,
}

impl Default for SubBassSettings {
    fn default() -> Self {
        Self {
            attack: 0.04,
            release: 0.4,
            level: 0.25,
        }
    }
}

pub struct SubBassVoice {
    frequency: f32,
    envelope: VoiceEnvelope,
    osc: Oscillator,
    bus: BusId,
    gain_buffer: Vec<f32>,
}

impl SubBassVoice {
    pub fn new(frequency: f32, bus: BusId, settings: &SubBassSettings) -> Self {
        Self {
            frequency,
            envelope: VoiceEnvelope::new(settings.level, settings.attack, settings.release),
            osc: Oscillator::sine(),
            bus,
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl Voice for SubBassVoice {
    fn start(&mut self, now: f64) {
        self.envelope.start(now);
    }

    fn stop(&mut self, now: f64) {
        self.envelope.stop(now);
    }

    fn update_pitch(&mut self, _multiplier: f32, _now: f64) {}

    fn base_frequency(&self) -> Option<f32> {
        None
    }

    fn set_level(&mut self, level: f32, now: f64) {
        self.envelope.set_level(level, now);
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
        self.envelope.render(gain, ctx);

        let (centre, _) = equal_power_pan(0.0);
        for i in 0..frames {
            let sample = self.osc.next_sample(self.frequency, ctx.sample_rate) * gain[i] * centre;
            left[i] += sample;
            right[i] += sample;
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubBassFactory {
    bus: BusId,
    sample_rate: f32,
    settings: SubBassSettings,
}

impl SubBassFactory {
    pub fn new(bus: BusId, sample_rate: f32, settings: SubBassSettings) -> Self {
        Self {
            bus,
            sample_rate,
            settings,
        }
    }
}

impl VoiceFactory for SubBassFactory {
    fn create_voice(&self, frequency: f32) -> Result<Box<dyn Voice>, VoiceError> {
        let frequency = validate_frequency(frequency, self.sample_rate)?;
        Ok(Box::new(SubBassVoice::new(frequency, self.bus, &self.settings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opts_out_of_pitch_bend() {
        let voice = SubBassVoice::new(65.0, BusId::Bass, &SubBassSettings::default());
        assert_eq!(voice.base_frequency(), None);
    }

    #[test]
    fn renders_centred_sine() {
        let mut voice = SubBassVoice::new(
            100.0,
            BusId::Bass,
            &SubBassSettings {
                attack: 0.0,
                ..SubBassSettings::default()
            },
        );
        voice.start(0.0);
        let mut left = vec![0.0; 480];
        let mut right = vec![0.0; 480];
        voice.render(&mut left, &mut right, &RenderCtx::new(48_000.0, 0.0));
        assert_eq!(left, right);
        let peak = left.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.1 && peak <= 0.25);
    }

    #[test]
    fn factory_routes_to_its_bus() {
        let factory = SubBassFactory::new(BusId::Bass, 48_000.0, SubBassSettings::default());
        assert_eq!(factory.create_voice(55.0).unwrap().bus(), BusId::Bass);
        assert!(factory.create_voice(0.0).is_err());
    }
}
