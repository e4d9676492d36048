//! Tempo-synced periodic gate.
//!
//! State machine:
//!
//! ```text
//!   ┌──────┐  amount > 0 and a parseable,   ┌─────────┐
//!   │ Idle │ ─────────────────────────────→ │ Running │ ──┐ cycle timer
//!   └──────┘       non-empty sequence       └─────────┘ ←─┘
//!      ↑                                         │
//!      └──── any reconfiguration, amount = 0, ───┘
//!            empty or malformed sequence
//! ```
//!
//! Every reconfiguration passes through `Idle`: the pending cycle timer is
//! cancelled, the bus curve is dropped and the bus gain snaps back to 1.0.
//! Only then is the new configuration started, so two configurations never
//! overlap.
//!
//! Curves are built once per note value and tempo and shared with the bus
//! timeline, so a steady gate does not allocate from cycle to cycle.

use std::sync::Arc;

use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{curve::gate_curve, sequence::GateSequence};
use crate::{
    automation::AudioParam,
    engine::scheduler::{TimerHandle, TimerQueue, TimerSlot},
    sequencing::{NoteValue, DEFAULT_BPM},
};

/// Timer payload for the next gate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Running,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GateSettings {
    /// Ducking depth, 0-100
    pub amount_percent: f32,
    /// Note-value tokens, e.g. `["8", "8", "4T"]`
    pub sequence: Vec<String>,
    /// Reshuffle the sequence every cycle
    pub random: bool,
}

/// What the gate touches while it runs.
pub struct GateEnv<'a, T> {
    pub timers: &'a mut TimerQueue<T>,
    pub bus: &'a mut dyn AudioParam,
    pub now: f64,
    /// Tempo in BPM, `None` means the 120 BPM default
    pub tempo: Option<f64>,
}

/// Curves for the running sequence at one tempo.
#[derive(Debug, Default)]
struct CurveCache {
    bpm: f64,
    curves: Vec<(NoteValue, Arc<[f32]>)>,
}

impl CurveCache {
    fn clear(&mut self) {
        self.curves.clear();
    }

    fn get_or_build(&mut self, value: NoteValue, bpm: f64, sample_rate: f32, amount: f32) -> Arc<[f32]> {
        if self.bpm != bpm {
            self.curves.clear();
            self.bpm = bpm;
        }
        if let Some((_, curve)) = self.curves.iter().find(|(cached, _)| *cached == value) {
            return Arc::clone(curve);
        }
        let curve: Arc<[f32]> = gate_curve(value.seconds(bpm), sample_rate, amount).into();
        self.curves.push((value, Arc::clone(&curve)));
        curve
    }

    fn len(&self) -> usize {
        self.curves.len()
    }
}

pub struct PeriodicGate {
    state: GateState,
    settings: GateSettings,
    sequence: Option<GateSequence>,
    timer: TimerSlot,
    sample_rate: f32,
    rng: StdRng,
    cycles: u64,
    curves: CurveCache,
}

impl PeriodicGate {
    pub fn new(sample_rate: f32, rng: StdRng) -> Self {
        Self {
            state: GateState::Idle,
            settings: GateSettings::default(),
            sequence: None,
            timer: TimerSlot::new(),
            sample_rate,
            rng,
            cycles: 0,
            curves: CurveCache::default(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == GateState::Running
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn sequence(&self) -> Option<&GateSequence> {
        self.sequence.as_ref()
    }

    /// Cycles applied since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Distinct curves built for the current configuration and tempo.
    pub fn cached_curves(&self) -> usize {
        self.curves.len()
    }

    /// Ducking depth as a 0..=1 fraction.
    pub fn amount(&self) -> f32 {
        (self.settings.amount_percent / 100.0).clamp(0.0, 1.0)
    }

    pub fn set_amount<T: From<GateTick>>(&mut self, percent: f32, env: GateEnv<'_, T>) {
        self.settings.amount_percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.restart(env);
    }

    pub fn set_sequence<T, I, S>(&mut self, tokens: I, random: bool, env: GateEnv<'_, T>)
    where
        T: From<GateTick>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.sequence = tokens.into_iter().map(Into::into).collect();
        self.settings.random = random;
        self.restart(env);
    }

    pub fn set_random<T: From<GateTick>>(&mut self, random: bool, env: GateEnv<'_, T>) {
        self.settings.random = random;
        self.restart(env);
    }

    /// Replace every setting at once.
    pub fn configure<T: From<GateTick>>(&mut self, settings: GateSettings, env: GateEnv<'_, T>) {
        self.settings = settings;
        self.settings.amount_percent = self.settings.amount_percent.clamp(0.0, 100.0);
        self.restart(env);
    }

    /// Stop gating: cancel the cycle timer and pin the bus at unity.
    pub fn stop<T>(&mut self, env: GateEnv<'_, T>) {
        self.timer.cancel(env.timers);
        env.bus.cancel_scheduled_values(env.now);
        env.bus.set_value(1.0);
        self.sequence = None;
        self.curves.clear();
        if self.state == GateState::Running {
            debug!("gate stopped");
        }
        self.state = GateState::Idle;
    }

    /// Handle a fired cycle timer. Timers from an earlier configuration are ignored.
    pub fn on_timer<T: From<GateTick>>(&mut self, handle: TimerHandle, deadline: f64, env: GateEnv<'_, T>) {
        if !self.timer.owns(handle) {
            trace!(?handle, "ignoring stale gate timer");
            return;
        }
        self.timer.clear();
        if self.state == GateState::Running {
            self.run_cycle(deadline, env);
        }
    }

    fn restart<T: From<GateTick>>(&mut self, env: GateEnv<'_, T>) {
        let GateEnv {
            timers,
            bus,
            now,
            tempo,
        } = env;
        self.stop(GateEnv {
            timers: &mut *timers,
            bus: &mut *bus,
            now,
            tempo,
        });

        let values = match NoteValue::parse_sequence(&self.settings.sequence) {
            Ok(values) => values,
            Err(err) => {
                warn!(%err, "gate disabled: bad sequence");
                return;
            }
        };
        if self.amount() <= 0.0 || values.is_empty() {
            debug!(amount = self.amount(), steps = values.len(), "gate idle");
            return;
        }

        let mut sequence = GateSequence::new(values, self.settings.random);
        sequence.restart(&mut self.rng);
        debug!(
            amount = self.amount(),
            steps = sequence.len(),
            random = sequence.is_random(),
            "gate running"
        );
        self.sequence = Some(sequence);
        self.state = GateState::Running;
        self.run_cycle(
            now,
            GateEnv {
                timers,
                bus,
                now,
                tempo,
            },
        );
    }

    fn run_cycle<T: From<GateTick>>(&mut self, start: f64, env: GateEnv<'_, T>) {
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };
        let Some(value) = sequence.advance(&mut self.rng) else {
            return;
        };

        let bpm = env.tempo.unwrap_or(DEFAULT_BPM);
        let seconds = value.seconds(bpm);
        let samples = seconds * self.sample_rate as f64;
        if !samples.is_finite() || samples < 1.0 {
            warn!(%value, bpm, "gate disabled: cycle shorter than a sample");
            self.stop(env);
            return;
        }
        let amount = self.amount();
        let curve = self.curves.get_or_build(value, bpm, self.sample_rate, amount);

        env.bus.cancel_scheduled_values(start);
        env.bus.set_value_curve_at_time(curve, start, seconds);
        self.timer.arm(env.timers, start + seconds, GateTick.into());
        self.cycles += 1;
        trace!(%value, seconds, start, "gate cycle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::ParamTimeline;
    use rand::SeedableRng;

    const SR: f32 = 1_000.0;

    struct Rig {
        gate: PeriodicGate,
        timers: TimerQueue<GateTick>,
        bus: ParamTimeline,
        tempo: Option<f64>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                gate: PeriodicGate::new(SR, StdRng::seed_from_u64(3)),
                timers: TimerQueue::new(),
                bus: ParamTimeline::new(1.0),
                tempo: None,
            }
        }

        fn env(&mut self, now: f64) -> (&mut PeriodicGate, GateEnv<'_, GateTick>) {
            (
                &mut self.gate,
                GateEnv {
                    timers: &mut self.timers,
                    bus: &mut self.bus,
                    now,
                    tempo: self.tempo,
                },
            )
        }

        fn set_amount(&mut self, percent: f32, now: f64) {
            let (gate, env) = self.env(now);
            gate.set_amount(percent, env);
        }

        fn set_sequence(&mut self, tokens: &[&str], random: bool, now: f64) {
            let (gate, env) = self.env(now);
            gate.set_sequence(tokens.iter().copied(), random, env);
        }

        /// Fire every timer due before `until`.
        fn run_until(&mut self, until: f64) {
            while let Some(fired) = self.timers.pop_due(until) {
                let (gate, env) = self.env(fired.deadline);
                gate.on_timer(fired.handle, fired.deadline, env);
            }
        }
    }

    #[test]
    fn needs_amount_and_sequence_to_run() {
        let mut rig = Rig::new();
        rig.set_sequence(&["4"], false, 0.0);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert!(rig.timers.is_empty());

        rig.set_amount(50.0, 0.0);
        assert_eq!(rig.gate.state(), GateState::Running);
        assert_eq!(rig.timers.next_deadline(), Some(0.5));
    }

    #[test]
    fn cycles_follow_the_sequence_at_tempo() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["4", "8"], false, 0.0);

        // 0.0: "4" (0.5s), 0.5: "8" (0.25s), 0.75: "4", 1.25: "8" ...
        rig.run_until(0.6);
        assert_eq!(rig.timers.next_deadline(), Some(0.75));
        rig.run_until(0.8);
        assert_eq!(rig.timers.next_deadline(), Some(1.25));
        assert_eq!(rig.gate.cycles(), 3);
    }

    #[test]
    fn tempo_is_read_each_cycle() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["4"], false, 0.0);
        rig.tempo = Some(60.0);
        rig.run_until(0.6);
        // second cycle started at 0.5 with a 1s beat
        assert_eq!(rig.timers.next_deadline(), Some(1.5));
    }

    #[test]
    fn bus_follows_the_curve_while_running() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["4"], false, 0.0);
        // quarter of the way through a 0.5s cycle is open, three quarters is ducked
        assert!(rig.bus.value_at(0.125) > 0.9);
        assert!(rig.bus.value_at(0.375) < 0.1);
    }

    #[test]
    fn disabling_forces_unity_and_clears_timer() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["4"], false, 0.0);
        rig.run_until(0.6);

        rig.set_amount(0.0, 0.7);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert!(rig.timers.is_empty());
        assert!(!rig.bus.has_events());
        for t in [0.7, 0.8, 0.9, 2.0] {
            assert_eq!(rig.bus.value_at(t), 1.0);
        }
    }

    #[test]
    fn empty_sequence_disables() {
        let mut rig = Rig::new();
        rig.set_amount(80.0, 0.0);
        rig.set_sequence(&["8"], false, 0.0);
        rig.set_sequence(&[], false, 0.1);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert_eq!(rig.bus.value_at(0.2), 1.0);
    }

    #[test]
    fn malformed_sequence_disables_instead_of_failing() {
        let mut rig = Rig::new();
        rig.set_amount(80.0, 0.0);
        rig.set_sequence(&["8", "banana"], false, 0.0);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert!(rig.timers.is_empty());
        assert_eq!(rig.bus.value_at(0.1), 1.0);
    }

    #[test]
    fn reconfigure_restarts_immediately() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["1"], false, 0.0);
        assert_eq!(rig.timers.next_deadline(), Some(2.0));

        rig.set_sequence(&["8"], false, 0.3);
        assert_eq!(rig.timers.len(), 1);
        let next = rig.timers.next_deadline().unwrap();
        assert!((next - 0.55).abs() < 1e-9, "next cycle at {next}");
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["4"], false, 0.0);
        let stale = rig.timers.pop_due(1.0).unwrap();

        rig.set_sequence(&["8"], false, 0.1);
        let cycles = rig.gate.cycles();
        let (gate, env) = rig.env(stale.deadline);
        gate.on_timer(stale.handle, stale.deadline, env);
        assert_eq!(rig.gate.cycles(), cycles);
        assert_eq!(rig.timers.len(), 1);
    }

    #[test]
    fn values_finer_than_a_sixty_fourth_leave_the_gate_idle() {
        let mut rig = Rig::new();
        rig.tempo = Some(999.0);
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["1000000"], false, 0.0);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert!(rig.timers.is_empty());
        assert_eq!(rig.bus.value_at(0.01), 1.0);
    }

    #[test]
    fn sub_sample_cycle_stops_the_gate() {
        // "64" at 999 BPM is 3.75 ms, under one sample at 100 Hz
        let mut rig = Rig::new();
        rig.gate = PeriodicGate::new(100.0, StdRng::seed_from_u64(3));
        rig.tempo = Some(999.0);
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["64"], false, 0.0);
        assert_eq!(rig.gate.state(), GateState::Idle);
        assert_eq!(rig.gate.cycles(), 0);
        assert!(rig.timers.is_empty());
        assert!(!rig.bus.has_events());
    }

    #[test]
    fn curves_are_reused_across_cycles() {
        let mut rig = Rig::new();
        rig.set_amount(100.0, 0.0);
        rig.set_sequence(&["8", "4", "8"], false, 0.0);
        rig.run_until(3.0);
        assert!(rig.gate.cycles() > 6);
        assert_eq!(rig.gate.cached_curves(), 2);

        // a tempo change rebuilds on demand
        rig.tempo = Some(90.0);
        rig.run_until(4.0);
        assert!(rig.gate.cached_curves() <= 2);

        rig.set_amount(0.0, 4.0);
        assert_eq!(rig.gate.cached_curves(), 0);
    }

    #[test]
    fn random_mode_keeps_running() {
        let mut rig = Rig::new();
        rig.set_amount(60.0, 0.0);
        rig.set_sequence(&["8", "8", "4T", "16"], true, 0.0);
        rig.run_until(5.0);
        assert!(rig.gate.is_running());
        assert!(rig.gate.cycles() > 10);
        let seq = rig.gate.sequence().unwrap();
        assert_eq!(seq.working().len(), 4);
    }
}
