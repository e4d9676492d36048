use rand::{rngs::StdRng, SeedableRng};
use ripple_dsp::{
    automation::ParamTimeline,
    engine::scheduler::TimerQueue,
    gate::{gate_curve, GateEnv, GateTick, PeriodicGate},
};
use rustfft::{num_complex::Complex, FftPlanner};

fn spectrum(signal: &[f32]) -> Vec<f32> {
    let mean = signal.iter().sum::<f32>() / signal.len() as f32;
    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s - mean, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    buffer.iter().map(|c| c.norm()).collect()
}

/// Magnitude of harmonic `n` of a signal holding `cycles` whole cycles.
fn harmonic(spectrum: &[f32], cycles: usize, n: usize) -> f32 {
    spectrum[cycles * n]
}

/// `even_tolerance` is the largest even harmonic allowed, relative to the
/// fundamental.
fn assert_odd_harmonics_only(signal: &[f32], cycles: usize, even_tolerance: f32) {
    let spec = spectrum(signal);
    let fundamental = harmonic(&spec, cycles, 1);
    assert!(fundamental > 0.0);

    for even in [2, 4, 6] {
        let level = harmonic(&spec, cycles, even) / fundamental;
        assert!(level < even_tolerance, "harmonic {even} at {level}");
    }
    let third = harmonic(&spec, cycles, 3) / fundamental;
    let fifth = harmonic(&spec, cycles, 5) / fundamental;
    assert!((0.2..0.45).contains(&third), "third at {third}");
    assert!((0.1..0.3).contains(&fifth), "fifth at {fifth}");

    // nothing between the harmonics
    let between = spec[cycles + cycles / 2];
    assert!(between / fundamental < 1e-3, "leakage {between}");
}

#[test]
fn single_curve_repeated_has_only_odd_harmonics() {
    let cycles = 32;
    let curve = gate_curve(0.1, 1_000.0, 1.0);
    assert_eq!(curve.len(), 100);
    let signal: Vec<f32> = std::iter::repeat(curve.iter().copied()).take(cycles).flatten().collect();
    assert_odd_harmonics_only(&signal, cycles, 1e-3);
}

#[test]
fn scheduled_gate_bus_has_only_odd_harmonics() {
    const SR: f32 = 1_000.0;
    const BLOCK: usize = 100;

    let mut gate = PeriodicGate::new(SR, StdRng::seed_from_u64(0));
    let mut timers: TimerQueue<GateTick> = TimerQueue::new();
    let mut bus = ParamTimeline::new(1.0);

    gate.set_amount(
        60.0,
        GateEnv {
            timers: &mut timers,
            bus: &mut bus,
            now: 0.0,
            tempo: None,
        },
    );
    // "16" at the default 120 BPM: 0.125 s, 125 samples per cycle
    gate.set_sequence(
        ["16"],
        false,
        GateEnv {
            timers: &mut timers,
            bus: &mut bus,
            now: 0.0,
            tempo: None,
        },
    );

    let cycles = 32;
    let frames = cycles * 125;
    let mut signal = vec![0.0f32; frames];
    for (block, out) in signal.chunks_mut(BLOCK).enumerate() {
        let start = (block * BLOCK) as f64 / SR as f64;
        let end = start + out.len() as f64 / SR as f64;
        while let Some(fired) = timers.pop_due(end) {
            gate.on_timer(
                fired.handle,
                fired.deadline,
                GateEnv {
                    timers: &mut timers,
                    bus: &mut bus,
                    now: fired.deadline,
                    tempo: None,
                },
            );
        }
        bus.render_block(out, start, SR);
    }

    assert!(signal.iter().all(|&g| (0.4 - 1e-6..=1.0 + 1e-6).contains(&g)));
    // the bus stretches each curve's points across the whole cycle, which
    // skews the two halves by under a sample
    assert_odd_harmonics_only(&signal, cycles, 0.05);
}
