//! One-shot sidechain duck.
//!
//! Every kick or snare pulls the melodic buses down and lets them swell back,
//! the "pumping" of sidechain compression without a compressor.
//!
//! ```text
//!   1.0 ─┐                  ╭──────
//!        │╲                ╱
//!        │ ╲              ╱
//!  floor │  ╲____________╱
//!        attack   hold    release
//! ```
//!
//! Both ramps are exponential. Re-triggering cancels whatever is in flight and
//! starts again from the current level, so the last hit always wins.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::automation::{exp_safe, AudioParam};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckEnvelope {
    /// Gain at the bottom of the duck
    pub duck_to: f32,
    /// Seconds to reach the floor
    pub attack: f64,
    /// Seconds held at the floor
    pub hold: f64,
    /// Seconds to recover to unity
    pub release: f64,
}

impl Default for DuckEnvelope {
    fn default() -> Self {
        Self {
            duck_to: 0.2,
            attack: 0.005,
            hold: 0.04,
            release: 0.2,
        }
    }
}

impl DuckEnvelope {
    /// Total time from trigger until the gain is back at 1.0.
    pub fn length(&self) -> f64 {
        self.attack + self.hold + self.release
    }

    /// Duck every target, starting at `now`.
    pub fn trigger(&self, targets: &mut [&mut dyn AudioParam], now: f64) {
        for target in targets.iter_mut() {
            self.apply(&mut **target, now);
        }
    }

    /// Duck a single gain parameter.
    pub fn apply(&self, gain: &mut dyn AudioParam, now: f64) {
        let floor = exp_safe(self.duck_to);
        let current = exp_safe(gain.value_at(now));
        let bottom = now + self.attack.max(0.0);
        let rise = bottom + self.hold.max(0.0);
        let end = rise + self.release.max(0.0);

        gain.cancel_scheduled_values(now);
        gain.set_value_at_time(current, now);
        gain.exponential_ramp_to_value_at_time(floor, bottom);
        gain.set_value_at_time(floor, rise);
        gain.exponential_ramp_to_value_at_time(1.0, end);
    }
}
