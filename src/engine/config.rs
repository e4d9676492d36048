#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    gate::{DuckEnvelope, GateSettings},
    graph::BusId,
    synth::RegistrySettings,
    theory::{DominantRule, HarmonyMode, DEFAULT_ROOT_FREQUENCY},
    voices::{PadSettings, SubBassSettings},
    DEFAULT_SAMPLE_RATE,
};

/// Everything a [`RippleEngine`](super::RippleEngine) is built from.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub root_frequency: f32,
    /// BPM; `None` runs the gate at 120
    pub tempo: Option<f64>,
    pub harmony: HarmonyMode,
    pub dominant_rule: DominantRule,
    pub gate: GateSettings,
    pub duck: DuckEnvelope,
    pub voices: RegistrySettings,
    pub pad: PadSettings,
    pub sub_bass: SubBassSettings,
    /// Bus pad voices play into
    pub pad_bus: BusId,
    /// Bus doubled bass voices play into
    pub bass_bus: BusId,
    pub master_gain: f32,
    /// Seed for the gate shuffle; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            root_frequency: DEFAULT_ROOT_FREQUENCY,
            tempo: None,
            harmony: HarmonyMode::default(),
            dominant_rule: DominantRule::default(),
            gate: GateSettings::default(),
            duck: DuckEnvelope::default(),
            voices: RegistrySettings::default(),
            pad: PadSettings::default(),
            sub_bass: SubBassSettings::default(),
            pad_bus: BusId::Melodic,
            bass_bus: BusId::Bass,
            master_gain: 0.8,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn root_frequency(mut self, root_frequency: f32) -> Self {
        self.root_frequency = root_frequency;
        self
    }

    pub fn tempo(mut self, bpm: f64) -> Self {
        self.tempo = Some(bpm);
        self
    }

    pub fn harmony(mut self, mode: HarmonyMode, rule: DominantRule) -> Self {
        self.harmony = mode;
        self.dominant_rule = rule;
        self
    }

    pub fn gate(mut self, gate: GateSettings) -> Self {
        self.gate = gate;
        self
    }

    pub fn duck(mut self, duck: DuckEnvelope) -> Self {
        self.duck = duck;
        self
    }

    pub fn bass_doubling(mut self, enabled: bool) -> Self {
        self.voices.bass_doubling = enabled;
        self
    }

    pub fn master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = EngineConfig::default()
            .sample_rate(44_100.0)
            .tempo(90.0)
            .harmony(HarmonyMode::Jazz79, DominantRule::Functional)
            .bass_doubling(true)
            .seed(5);
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.tempo, Some(90.0));
        assert_eq!(config.harmony, HarmonyMode::Jazz79);
        assert_eq!(config.dominant_rule, DominantRule::Functional);
        assert!(config.voices.bass_doubling);
        assert_eq!(config.seed, Some(5));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            tempo = 100.0
            harmony = "jazz13"

            [gate]
            amount_percent = 60.0
            sequence = ["8", "8", "4T"]
            random = true
            "#,
        )
        .unwrap();

        assert_eq!(config.tempo, Some(100.0));
        assert_eq!(config.harmony, HarmonyMode::Jazz13);
        assert_eq!(config.gate.sequence, vec!["8", "8", "4T"]);
        assert!(config.gate.random);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(config.duck, DuckEnvelope::default());
    }
}
