//! The engine: one owner for tuning, voices, gate, duck and buses.
//!
//! Per block:
//!
//! ```text
//!   drain control queue → fire timers due before block end → render voices
//!   into buses → mix buses to output → advance clock
//! ```
//!
//! Timers are checked against the end of the block about to render, so a
//! gate cycle due mid-block is scheduled before the block is rendered and
//! starts on its exact sample.

pub mod config;
pub mod scheduler;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace, warn};

use self::{
    config::EngineConfig,
    scheduler::{Fired, TimerQueue},
};
use crate::{
    automation::{AudioClock, AudioParam, SampleClock},
    dsp::mix::soft_limit_in_place,
    gate::{DuckEnvelope, GateEnv, GateSettings, GateTick, PeriodicGate},
    graph::{BusGraph, BusId, RenderCtx},
    io::AudioOutput,
    synth::{ControlMessage, MessageReceiver, NoteKey, NoteRegistry, SynthError},
    theory::{ChordExtension, DominantRule, HarmonyMode, Tuning},
    voices::{PadFactory, SubBassFactory},
    MAX_BLOCK_SIZE,
};

pub const MIN_TEMPO: f64 = 20.0;
pub const MAX_TEMPO: f64 = 999.0;

/// Work the timer queue can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTask {
    GateCycle,
}

impl From<GateTick> for EngineTask {
    fn from(_: GateTick) -> Self {
        EngineTask::GateCycle
    }
}

pub struct RippleEngine {
    clock: SampleClock,
    tuning: Tuning,
    harmony: HarmonyMode,
    dominant_rule: DominantRule,
    registry: NoteRegistry,
    gate: PeriodicGate,
    duck: DuckEnvelope,
    buses: BusGraph,
    timers: TimerQueue<EngineTask>,
    tempo: Option<f64>,
    rx: Option<Box<dyn MessageReceiver>>,
}

impl RippleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let sample_rate = config.sample_rate;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let registry = NoteRegistry::new(
            Box::new(PadFactory::new(config.pad_bus, sample_rate, config.pad)),
            Box::new(SubBassFactory::new(config.bass_bus, sample_rate, config.sub_bass)),
            config.voices,
        );

        let mut engine = Self {
            clock: SampleClock::new(sample_rate),
            tuning: Tuning::new(config.root_frequency),
            harmony: config.harmony,
            dominant_rule: config.dominant_rule,
            registry,
            gate: PeriodicGate::new(sample_rate, rng),
            duck: config.duck,
            buses: BusGraph::new(),
            timers: TimerQueue::new(),
            tempo: None,
            rx: None,
        };
        if let Some(bpm) = config.tempo {
            engine.set_tempo(bpm);
        }
        engine.buses.gain_mut(BusId::Master).set_value(config.master_gain);
        engine.configure_gate(config.gate);

        debug!(
            sample_rate,
            root = engine.tuning.root_frequency(),
            harmony = ?engine.harmony,
            gate = engine.gate.is_running(),
            "engine ready"
        );
        engine
    }

    /// Drain `rx` at the start of every block.
    pub fn with_receiver(mut self, rx: impl MessageReceiver + 'static) -> Self {
        self.rx = Some(Box::new(rx));
        self
    }

    pub fn set_receiver(&mut self, rx: impl MessageReceiver + 'static) {
        self.rx = Some(Box::new(rx));
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    /// Audio time of the next block's first sample.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Tempo the gate uses, defaulting to 120.
    pub fn tempo(&self) -> Option<f64> {
        self.tempo
    }

    pub fn harmony(&self) -> (HarmonyMode, DominantRule) {
        (self.harmony, self.dominant_rule)
    }

    pub fn registry(&self) -> &NoteRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &PeriodicGate {
        &self.gate
    }

    pub fn buses(&self) -> &BusGraph {
        &self.buses
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn set_root_frequency(&mut self, root_frequency: f32) {
        if !root_frequency.is_finite() || root_frequency <= 0.0 {
            warn!(root_frequency, "ignoring invalid root frequency");
            return;
        }
        self.tuning.set_root_frequency(root_frequency);
        debug!(root_frequency, "root frequency");
    }

    /// Clamped to `MIN_TEMPO..=MAX_TEMPO`; the gate picks it up on its next cycle.
    pub fn set_tempo(&mut self, bpm: f64) {
        if !bpm.is_finite() {
            warn!(bpm, "ignoring invalid tempo");
            return;
        }
        let clamped = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
        if clamped != bpm {
            debug!(bpm, clamped, "tempo clamped");
        }
        self.tempo = Some(clamped);
    }

    pub fn set_gate_amount(&mut self, percent: f32) {
        let (gate, env) = self.gate_parts(self.clock.now());
        gate.set_amount(percent, env);
    }

    pub fn set_gate_sequence<I, S>(&mut self, tokens: I, random: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (gate, env) = self.gate_parts(self.clock.now());
        gate.set_sequence(tokens, random, env);
    }

    pub fn set_gate_random(&mut self, random: bool) {
        let (gate, env) = self.gate_parts(self.clock.now());
        gate.set_random(random, env);
    }

    pub fn configure_gate(&mut self, settings: GateSettings) {
        let (gate, env) = self.gate_parts(self.clock.now());
        gate.configure(settings, env);
    }

    pub fn start_note(&mut self, frequency: f32, key: NoteKey, degree: Option<usize>) -> Result<(), SynthError> {
        let now = self.clock.now();
        self.registry.start_note(frequency, key, degree, &self.tuning, now)
    }

    /// Play a scale degree as a single note, doubled if bass doubling is on.
    pub fn start_scale_note(&mut self, degree: usize, octave_shift: i32, key: NoteKey) -> Result<(), SynthError> {
        let frequency = self.tuning.scale_note_frequency(degree, octave_shift)?;
        self.start_note(frequency, key, Some(degree))
    }

    /// Chord on `degree` with the extensions the harmony mode picks.
    pub fn start_chord(&mut self, degree: usize, key: NoteKey) -> Result<(), SynthError> {
        let extensions = self.harmony.extensions_for(degree, self.dominant_rule);
        self.start_chord_with(degree, key, &extensions)
    }

    pub fn start_chord_with(
        &mut self,
        degree: usize,
        key: NoteKey,
        extensions: &[ChordExtension],
    ) -> Result<(), SynthError> {
        let now = self.clock.now();
        self.registry.start_chord(degree, key, extensions, &self.tuning, now)
    }

    pub fn release(&mut self, key: NoteKey) {
        self.registry.release(key, self.clock.now());
    }

    pub fn release_all(&mut self) {
        self.registry.release_all(self.clock.now());
    }

    pub fn pitch_bend(&mut self, key: NoteKey, multiplier: f32) {
        self.registry.update_pitch_bend(key, multiplier, self.clock.now());
    }

    /// Duck the melodic and bass buses, as a kick or snare would.
    pub fn trigger_percussion(&mut self) {
        let now = self.clock.now();
        self.duck.trigger(&mut self.buses.duck_targets(), now);
        trace!(now, "percussion duck");
    }

    pub fn set_bass_doubling(&mut self, enabled: bool) {
        self.registry.set_bass_doubling(enabled);
    }

    pub fn set_harmony(&mut self, mode: HarmonyMode, rule: DominantRule) {
        self.harmony = mode;
        self.dominant_rule = rule;
        debug!(?mode, ?rule, "harmony");
    }

    /// Apply one control message. Only note triggers can fail.
    pub fn handle_message(&mut self, message: ControlMessage) -> Result<(), SynthError> {
        match message {
            ControlMessage::NoteOn { key, frequency, degree } => self.start_note(frequency, key, degree)?,
            ControlMessage::ChordOn { key, degree } => self.start_chord(degree, key)?,
            ControlMessage::ChordWith { key, degree, extensions } => {
                self.start_chord_with(degree, key, &extensions)?
            }
            ControlMessage::NoteOff { key } => self.release(key),
            ControlMessage::AllNotesOff => self.release_all(),
            ControlMessage::PitchBend { key, multiplier } => self.pitch_bend(key, multiplier),
            ControlMessage::Percussion => self.trigger_percussion(),
            ControlMessage::SetRootFrequency(root) => self.set_root_frequency(root),
            ControlMessage::SetTempo(bpm) => self.set_tempo(bpm),
            ControlMessage::SetGateAmount(percent) => self.set_gate_amount(percent),
            ControlMessage::SetGateSequence { tokens, random } => self.set_gate_sequence(tokens, random),
            ControlMessage::SetGateRandom(random) => self.set_gate_random(random),
            ControlMessage::ConfigureGate(settings) => self.configure_gate(settings),
            ControlMessage::SetBassDoubling(enabled) => self.set_bass_doubling(enabled),
            ControlMessage::SetHarmony { mode, rule } => self.set_harmony(mode, rule),
        }
        Ok(())
    }

    /// Render `frames` samples of stereo into `output`.
    pub fn process_block(&mut self, frames: usize, output: &mut AudioOutput) {
        let frames = frames.min(MAX_BLOCK_SIZE);
        self.drain_messages();

        let sample_rate = self.clock.sample_rate();
        let ctx = RenderCtx::new(sample_rate, self.clock.now());
        self.fire_timers(ctx.end_time(frames));

        self.buses.begin_block(frames);
        self.registry.render(&mut self.buses, &ctx);

        let (left, right) = output.stereo_mut(frames);
        self.buses.mix_to(left, right, ctx.time, sample_rate);
        soft_limit_in_place(left);
        soft_limit_in_place(right);

        self.clock.advance(frames);
    }

    fn drain_messages(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        while let Some(message) = rx.pop() {
            if let Err(err) = self.handle_message(message) {
                warn!(%err, "control message failed");
            }
        }
        self.rx = Some(rx);
    }

    fn fire_timers(&mut self, until: f64) {
        while let Some(Fired { handle, deadline, task }) = self.timers.pop_due(until) {
            match task {
                EngineTask::GateCycle => {
                    let (gate, env) = self.gate_parts(deadline);
                    gate.on_timer(handle, deadline, env);
                }
            }
        }
    }

    fn gate_parts(&mut self, now: f64) -> (&mut PeriodicGate, GateEnv<'_, EngineTask>) {
        (
            &mut self.gate,
            GateEnv {
                timers: &mut self.timers,
                bus: self.buses.gain_mut(BusId::Gate),
                now,
                tempo: self.tempo,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;

    const SR: f32 = 1_000.0;

    fn engine() -> RippleEngine {
        RippleEngine::new(EngineConfig::default().sample_rate(SR).seed(11))
    }

    fn run(engine: &mut RippleEngine, seconds: f64) -> AudioOutput {
        let mut output = AudioOutput::default();
        let blocks = (seconds * SR as f64 / 100.0).round() as usize;
        for _ in 0..blocks {
            engine.process_block(100, &mut output);
        }
        output
    }

    #[test]
    fn tempo_is_clamped() {
        let mut engine = engine();
        engine.set_tempo(5.0);
        assert_eq!(engine.tempo(), Some(MIN_TEMPO));
        engine.set_tempo(5_000.0);
        assert_eq!(engine.tempo(), Some(MAX_TEMPO));
        engine.set_tempo(f64::NAN);
        assert_eq!(engine.tempo(), Some(MAX_TEMPO));
    }

    #[test]
    fn gate_cycles_fire_from_process_block() {
        let mut engine = engine();
        engine.set_gate_sequence(["4"], false);
        engine.set_gate_amount(100.0);
        assert_eq!(engine.gate().state(), GateState::Running);
        assert_eq!(engine.pending_timers(), 1);

        run(&mut engine, 2.0);
        // one cycle per half second at 120 BPM, the first at t = 0
        assert_eq!(engine.gate().cycles(), 4);
        assert_eq!(engine.pending_timers(), 1);
    }

    #[test]
    fn fastest_gate_stays_within_a_few_cycles_per_block() {
        let mut engine = RippleEngine::new(EngineConfig::default().seed(11));
        engine.set_tempo(MAX_TEMPO);
        engine.set_gate_amount(100.0);
        let mut output = AudioOutput::default();

        engine.set_gate_sequence(["1000000"], false);
        engine.process_block(512, &mut output);
        assert_eq!(engine.gate().state(), GateState::Idle);
        assert_eq!(engine.gate().cycles(), 0);
        assert_eq!(engine.pending_timers(), 0);

        // a sixty-fourth at 999 BPM is 180 samples at 48 kHz
        engine.set_gate_sequence(["64"], false);
        engine.process_block(512, &mut output);
        assert!(engine.gate().is_running());
        assert!(engine.gate().cycles() <= 3, "{} cycles", engine.gate().cycles());
        assert_eq!(engine.gate().cached_curves(), 1);
    }

    #[test]
    fn disabling_gate_returns_bus_to_unity() {
        let mut engine = engine();
        engine.set_gate_sequence(["8", "4T"], true);
        engine.set_gate_amount(70.0);
        run(&mut engine, 0.35);

        engine.set_gate_amount(0.0);
        assert_eq!(engine.pending_timers(), 0);
        let now = engine.now();
        assert_eq!(engine.buses().gain(BusId::Gate).value_at(now), 1.0);
        run(&mut engine, 1.0);
        assert_eq!(engine.buses().gain(BusId::Gate).value_at(engine.now()), 1.0);
        assert_eq!(engine.gate().state(), GateState::Idle);
    }

    #[test]
    fn percussion_ducks_melodic_and_bass_only() {
        let mut engine = engine();
        run(&mut engine, 0.1);
        let hit = engine.now();
        engine.trigger_percussion();
        let floor = DuckEnvelope::default().duck_to;
        let at_floor = hit + DuckEnvelope::default().attack;
        for bus in [BusId::Melodic, BusId::Bass] {
            assert!((engine.buses().gain(bus).value_at(at_floor) - floor).abs() < 1e-4);
        }
        assert_eq!(engine.buses().gain(BusId::Gate).value_at(at_floor), 1.0);
        assert_eq!(engine.buses().gain(BusId::Percussion).value_at(at_floor), 1.0);
    }

    #[test]
    fn harmony_mode_picks_extensions() {
        let mut engine = engine();
        engine.set_harmony(HarmonyMode::Jazz7, DominantRule::Positional);
        engine.start_chord(6, NoteKey(1)).unwrap();
        assert_eq!(engine.registry().voice_count(NoteKey(1)), 4);

        engine.set_harmony(HarmonyMode::Jazz13, DominantRule::Positional);
        engine.start_chord(6, NoteKey(1)).unwrap();
        assert_eq!(engine.registry().voice_count(NoteKey(1)), 6);
        assert_eq!(engine.registry().len(), 1);
    }

    #[test]
    fn root_change_only_affects_new_notes() {
        let mut engine = engine();
        engine.start_chord_with(2, NoteKey(1), &[]).unwrap();
        engine.set_root_frequency(220.0);
        engine.start_chord_with(2, NoteKey(2), &[]).unwrap();

        let old = engine.registry().entry(NoteKey(1)).unwrap().frequencies();
        let new = engine.registry().entry(NoteKey(2)).unwrap().frequencies();
        assert!((old[0] - 261.63).abs() < 1e-3);
        assert!((new[0] - 220.0).abs() < 1e-3);

        engine.set_root_frequency(-3.0);
        assert_eq!(engine.tuning().root_frequency(), 220.0);
    }

    #[test]
    fn released_chord_fades_and_frees() {
        let mut engine = engine();
        engine.start_chord(2, NoteKey(1)).unwrap();
        run(&mut engine, 0.5);
        engine.release(NoteKey(1));
        assert_eq!(engine.registry().releasing_count(), 3);

        run(&mut engine, 1.0);
        assert_eq!(engine.registry().sounding_voices(), 0);
        let output = run(&mut engine, 0.1);
        assert!(output.buffers.iter().flatten().all(|&s| s == 0.0));
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn drains_control_queue() {
        use crate::synth::message::control_channel;

        let (mut tx, rx) = control_channel(16);
        let mut engine = engine().with_receiver(rx);
        tx.push(ControlMessage::SetTempo(90.0)).unwrap();
        tx.push(ControlMessage::ChordOn { key: NoteKey(5), degree: 2 }).unwrap();
        tx.push(ControlMessage::ChordOn { key: NoteKey(6), degree: 40 }).unwrap();

        run(&mut engine, 0.1);
        assert_eq!(engine.tempo(), Some(90.0));
        assert!(engine.registry().is_active(NoteKey(5)));
        assert!(!engine.registry().is_active(NoteKey(6)));
    }
}
