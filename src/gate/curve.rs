/*
Gate Curve
==========

One gate cycle is a soft square wave: the bus gain sits high for the first
half of the cycle and dips for the second half. A hard square would click,
so the shape is the first three odd harmonics of the square wave's Fourier
series:

  square(t) ≈ (4/π) · ( sin ωt + (1/3)·sin 3ωt + (1/5)·sin 5ωt ),   ω = 2π / T

where T is the cycle length in seconds. Three terms already overshoot ±1 a
little (Gibbs ripple), so the sum is clamped to [-1, 1] before use.

Mapping to gain
---------------

  raw      clamp(square(t), -1, 1)
  unit     (raw + 1) / 2                    0 .. 1
  gain     (1 - amount) + amount · unit     1-amount .. 1
  out      clamp(gain, 0, 1)

With amount = 0 the curve is flat at 1.0; with amount = 1 it swings the full
0 .. 1 range.

The curve has ceil(T · sample_rate) samples so it covers the whole cycle.
*/

use std::f64::consts::PI;

/// Sum of the first three odd harmonics, scaled like a unit square wave.
#[inline]
pub fn fourier_square(phase: f64) -> f64 {
    (4.0 / PI) * (phase.sin() + (3.0 * phase).sin() / 3.0 + (5.0 * phase).sin() / 5.0)
}

/// Number of samples in one cycle of `duration` seconds.
pub fn curve_len(duration: f64, sample_rate: f32) -> usize {
    if !(duration.is_finite() && duration > 0.0) {
        return 0;
    }
    (duration * sample_rate as f64).ceil() as usize
}

/// Gain curve for one gate cycle.
///
/// `amount` is the ducking depth in 0..=1.
pub fn gate_curve(duration: f64, sample_rate: f32, amount: f32) -> Vec<f32> {
    let len = curve_len(duration, sample_rate);
    let amount = amount.clamp(0.0, 1.0) as f64;
    let omega = 2.0 * PI / duration;

    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let raw = fourier_square(omega * t).clamp(-1.0, 1.0);
            let unit = (raw + 1.0) / 2.0;
            let gain = (1.0 - amount) + amount * unit;
            gain.clamp(0.0, 1.0) as f32
        })
        .collect()
}
