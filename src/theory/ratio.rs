#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A frequency ratio kept as an exact fraction.
///
/// Just intonation builds every interval from small whole-number ratios
/// (3/2 is a pure fifth, 5/4 a pure major third), so the tables store the
/// fraction and only convert to floating point at the very end.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    pub const UNISON: Ratio = Ratio::new(1, 1);

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Zero denominators produce `inf`/`NaN`; callers own that.
    #[inline]
    pub fn as_f32(self) -> f32 {
        self.numerator as f32 / self.denominator as f32
    }
}

/// `root * numerator / denominator`.
#[inline]
pub fn frequency_from_ratio(ratio: Ratio, root_frequency: f32) -> f32 {
    root_frequency * ratio.as_f32()
}
