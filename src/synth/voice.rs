use crate::{
    automation::{exp_safe, AudioParam, ParamTimeline},
    graph::{BusId, RenderCtx},
    MIN_GAIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Pending,   // Created, not started yet
    Active,    // Attack or sustain
    Releasing, // Stopped, gain ramping down
    Finished,  // Release window elapsed, silent for good
}

/// A sounding voice as the registry sees it.
///
/// Voices own their own gain and pitch; nothing else writes to them. `render`
/// adds into the bus buffers rather than overwriting them, so many voices can
/// share one bus.
pub trait Voice: Send {
    fn start(&mut self, now: f64);

    /// Ramp down over the voice's release window, then go silent.
    fn stop(&mut self, now: f64);

    /// Bend relative to the voice's base frequency.
    fn update_pitch(&mut self, multiplier: f32, now: f64);

    /// Frequency pitch bends are measured against. `None` opts out of bends.
    fn base_frequency(&self) -> Option<f32>;

    /// Peak gain, replacing whatever level the factory picked.
    fn set_level(&mut self, level: f32, now: f64);

    /// Stereo position, -1..=1. Mono-centred voices may ignore it.
    fn set_pan(&mut self, _pan: f32) {}

    fn state(&self) -> VoiceState;

    /// Still audible at `now` (active, or releasing within its window).
    fn is_sounding(&self, now: f64) -> bool;

    /// Bus this voice renders into, fixed at construction.
    fn bus(&self) -> BusId;

    fn render(&mut self, left: &mut [f32], right: &mut [f32], ctx: &RenderCtx);
}

/// Shortest glide used when a level changes after the attack has finished.
const LEVEL_GLIDE: f64 = 0.01;

/// Attack/release gain shared by the built-in voices.
///
/// Linear attack from silence to `level`, hold, exponential release to
/// silence. The release always starts from the gain the voice actually has
/// at the moment of the stop, so stopping mid-attack does not jump.
#[derive(Debug, Clone)]
pub struct VoiceEnvelope {
    gain: ParamTimeline,
    level: f32,
    attack: f64,
    release: f64,
    state: VoiceState,
    attack_end: f64,
    stop_at: Option<f64>,
}

impl VoiceEnvelope {
    pub fn new(level: f32, attack: f64, release: f64) -> Self {
        Self {
            gain: ParamTimeline::new(0.0),
            level: level.max(0.0),
            attack: attack.max(0.0),
            release: release.max(0.0),
            state: VoiceState::Pending,
            attack_end: 0.0,
            stop_at: None,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn release_time(&self) -> f64 {
        self.release
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn gain(&self) -> &ParamTimeline {
        &self.gain
    }

    pub fn start(&mut self, now: f64) {
        self.state = VoiceState::Active;
        self.attack_end = now + self.attack;
        self.stop_at = None;
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(0.0, now);
        self.gain.linear_ramp_to_value_at_time(self.level, self.attack_end);
    }

    pub fn set_level(&mut self, level: f32, now: f64) {
        self.level = level.max(0.0);
        if self.state != VoiceState::Active {
            return;
        }
        let current = self.gain.value_at(now);
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(current, now);
        self.gain
            .linear_ramp_to_value_at_time(self.level, self.attack_end.max(now + LEVEL_GLIDE));
    }

    pub fn stop(&mut self, now: f64) {
        match self.state {
            VoiceState::Active => {
                let end = now + self.release;
                let current = exp_safe(self.gain.value_at(now));
                self.gain.cancel_scheduled_values(now);
                self.gain.set_value_at_time(current, now);
                self.gain.exponential_ramp_to_value_at_time(MIN_GAIN, end);
                self.gain.set_value_at_time(0.0, end);
                self.state = VoiceState::Releasing;
                self.stop_at = Some(end);
            }
            VoiceState::Pending => {
                self.state = VoiceState::Finished;
                self.stop_at = Some(now);
            }
            VoiceState::Releasing | VoiceState::Finished => {}
        }
    }

    pub fn is_sounding(&self, now: f64) -> bool {
        match self.state {
            VoiceState::Active => true,
            VoiceState::Releasing => self.stop_at.is_some_and(|end| now < end),
            VoiceState::Pending | VoiceState::Finished => false,
        }
    }

    /// Gain curve for one block, written into `out`.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.gain.render_block(out, ctx.time, ctx.sample_rate);
        if self.state == VoiceState::Releasing && !self.is_sounding(ctx.end_time(out.len())) {
            self.state = VoiceState::Finished;
        }
    }
}
