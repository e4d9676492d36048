//! Just-intonation music theory.
//!
//! Everything here is pure: a [`Tuning`] carries the only piece of mutable
//! state (the root frequency) and the degree, triad and extension tables are
//! static.

/// Harmony policies deciding which extensions a degree gets.
pub mod harmony;
/// Rational frequency ratios.
pub mod ratio;
/// Scale degrees, triads and chord extensions.
pub mod scale;

pub use harmony::{DominantRule, HarmonicFunction, HarmonyMode};
pub use ratio::{frequency_from_ratio, Ratio};
pub use scale::{ChordExtension, ChordType, ScaleDegree, TheoryError, Tuning, DEFAULT_ROOT_FREQUENCY, SCALE};
