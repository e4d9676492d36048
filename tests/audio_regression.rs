use ripple_dsp::{
    gate::GateSettings,
    io::AudioOutput,
    synth::NoteKey,
    theory::{DominantRule, HarmonyMode},
    EngineConfig, RippleEngine,
};

const BLOCK: usize = 256;

fn render(engine: &mut RippleEngine, blocks: usize) -> Vec<f32> {
    let mut output = AudioOutput::default();
    let mut samples = Vec::with_capacity(blocks * BLOCK * 2);
    for _ in 0..blocks {
        engine.process_block(BLOCK, &mut output);
        samples.extend(output.buffers.iter().flat_map(|c| c.iter()).copied());
    }
    samples
}

#[test]
fn renders_silence_with_empty_scene() {
    let mut engine = RippleEngine::new(EngineConfig::default());
    let samples = render(&mut engine, 8);
    assert_eq!(samples.len(), 8 * BLOCK * 2);
    assert!(samples.iter().all(|&s| s == 0.0));
}

#[test]
fn default_chord_is_finite_and_bounded() {
    let mut engine = RippleEngine::new(EngineConfig::default().seed(1));
    engine.start_chord(2, NoteKey::from('a')).unwrap();
    let samples = render(&mut engine, 40);
    assert!(samples.iter().any(|s| s.abs() > 0.0));
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
}

#[test]
fn dense_scene_stays_bounded() {
    let gate = GateSettings {
        amount_percent: 80.0,
        sequence: vec!["8".into(), "16".into(), "4T".into()],
        random: true,
    };
    let config = EngineConfig::default()
        .seed(9)
        .tempo(140.0)
        .bass_doubling(true)
        .harmony(HarmonyMode::Jazz13, DominantRule::Functional)
        .gate(gate);
    let mut engine = RippleEngine::new(config);

    for degree in 0..14 {
        engine.start_chord(degree, NoteKey(degree as u32)).unwrap();
    }
    let mut samples = Vec::new();
    for block in 0..200 {
        if block % 20 == 0 {
            engine.trigger_percussion();
        }
        samples.extend(render(&mut engine, 1));
    }
    assert!(samples.iter().all(|s| s.is_finite() && s.abs() <= 1.0));
    assert!(samples.iter().any(|s| s.abs() > 0.01));
}

#[test]
fn seeded_renders_are_deterministic() {
    let build = || {
        let gate = GateSettings {
            amount_percent: 100.0,
            sequence: vec!["8".into(), "4".into(), "8T".into(), "16".into()],
            random: true,
        };
        let mut engine = RippleEngine::new(EngineConfig::default().seed(42).gate(gate));
        engine.start_chord(5, NoteKey(1)).unwrap();
        engine
    };
    let a = render(&mut build(), 100);
    let b = render(&mut build(), 100);
    assert_eq!(a, b);
}

#[test]
fn gate_dips_the_melodic_signal() {
    let mut open = RippleEngine::new(EngineConfig::default().seed(3));
    let gate = GateSettings {
        amount_percent: 100.0,
        sequence: vec!["4".into()],
        random: false,
    };
    let mut gated = RippleEngine::new(EngineConfig::default().seed(3).gate(gate));
    for engine in [&mut open, &mut gated] {
        engine.start_chord(2, NoteKey(1)).unwrap();
    }

    let energy = |samples: &[f32]| samples.iter().map(|s| s * s).sum::<f32>();
    let open = energy(&render(&mut open, 200));
    let gated = energy(&render(&mut gated, 200));
    assert!(gated < open * 0.8, "gated {gated} vs open {open}");
}
