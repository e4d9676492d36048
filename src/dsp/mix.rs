//! Summing, gain and stereo placement.

/*
Stereo Placement
================

Chord voices are spread a little across the stereo field so the chord feels
wide without its notes separating into distinct positions.

Vocabulary
----------

  pan         Position in the stereo field, -1.0 (hard left) to +1.0 (hard
              right). 0.0 is centre.

  equal-power Pan law that keeps perceived loudness constant as a sound moves.
              Linear panning (left = 1 - p, right = p) dips ~3 dB in the
              middle; equal-power does not.


The Math: Equal-Power Pan
-------------------------

Map pan into an angle θ from 0 to π/2:

    θ = (pan + 1) × π/4

    left  = cos θ
    right = sin θ

At centre both sides are cos(π/4) = sin(π/4) ≈ 0.707, and
left² + right² = 1 everywhere, so total power never changes.

    pan   left   right
    -1    1.000  0.000
     0    0.707  0.707
    +1    0.000  1.000


Clipping Risk
-------------

Summing voices onto a bus can exceed ±1.0. Voice levels are kept modest and
the master bus is soft-limited at the very end instead.
*/

use std::f32::consts::FRAC_PI_4;

/// Left/right gains for `pan` in -1..=1.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// Add signal B into signal A in-place (summing).
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}

/// Add `b × gain` into `a`.
#[inline]
pub fn sum_scaled_in_place(a: &mut [f32], b: &[f32], gain: f32) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb * gain;
    }
}

/// Multiply a signal by a per-sample gain curve.
#[inline]
pub fn apply_gain_in_place(signal: &mut [f32], gain: &[f32]) {
    debug_assert_eq!(signal.len(), gain.len());

    for (s, &g) in signal.iter_mut().zip(gain.iter()) {
        *s *= g;
    }
}

/// Gentle tanh limiter for the output stage; keeps samples inside ±1.0.
#[inline]
pub fn soft_limit_in_place(signal: &mut [f32]) {
    for s in signal.iter_mut() {
        *s = s.tanh();
    }
}
