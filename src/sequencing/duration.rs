/// Musical note duration represented as a rational fraction of a whole note.
/// All operations preserve exact ratios until the final conversion to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration {
    /// Numerator: how many parts
    pub numerator: u32,
    /// Denominator: of what size (4 = quarter, 8 = eighth, etc.)
    pub denominator: u32,
}

/// Tempo used when nobody has set one.
pub const DEFAULT_BPM: f64 = 120.0;

impl Duration {
    pub const WHOLE: Duration = Duration::of(1);
    pub const HALF: Duration = Duration::of(2);
    pub const QUARTER: Duration = Duration::of(4);
    pub const EIGHTH: Duration = Duration::of(8);
    pub const SIXTEENTH: Duration = Duration::of(16);

    /// `1/denominator` of a whole note.
    pub const fn of(denominator: u32) -> Self {
        Duration {
            numerator: 1,
            denominator,
        }
    }

    /// Create a triplet: multiply duration by 2/3
    /// (three notes in the time of two)
    pub const fn triplet(self) -> Self {
        self.tuplet(2, 3)
    }

    /// General tuplet: `played` notes in the time of `in_time_of` notes
    pub const fn tuplet(self, in_time_of: u32, played: u32) -> Self {
        Duration {
            numerator: self.numerator * in_time_of,
            denominator: self.denominator * played,
        }
    }

    /// Reduce the fraction to lowest terms using GCD
    pub const fn reduce(self) -> Self {
        let gcd = const_gcd(self.numerator, self.denominator);
        Duration {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }

    /// Length in beats, where one beat is a quarter note.
    pub fn beats(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator as f64
    }

    /// Length in seconds at `bpm`. One beat lasts `60 / bpm` seconds.
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        self.beats() * beat_seconds(bpm)
    }
}

/// Seconds per beat. Non-positive or non-finite tempos fall back to [`DEFAULT_BPM`].
pub fn beat_seconds(bpm: f64) -> f64 {
    let bpm = if bpm.is_finite() && bpm > 0.0 { bpm } else { DEFAULT_BPM };
    60.0 / bpm
}

/// Compute greatest common divisor (Euclidean algorithm)
const fn const_gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn quarter_is_one_beat() {
        assert_close(Duration::QUARTER.beats(), 1.0);
        assert_close(Duration::WHOLE.beats(), 4.0);
        assert_close(Duration::SIXTEENTH.beats(), 0.25);
    }

    #[test]
    fn seconds_at_120_bpm() {
        assert_close(Duration::QUARTER.to_seconds(120.0), 0.5);
        assert_close(Duration::EIGHTH.to_seconds(120.0), 0.25);
        assert_close(Duration::HALF.to_seconds(60.0), 2.0);
    }

    #[test]
    fn triplets_are_two_thirds() {
        assert_close(Duration::QUARTER.triplet().beats(), 2.0 / 3.0);
        assert_close(Duration::EIGHTH.triplet().beats(), 1.0 / 3.0);
    }

    #[test]
    fn reduce() {
        let d = Duration {
            numerator: 6,
            denominator: 9,
        }
        .reduce();
        assert_eq!(d, Duration { numerator: 2, denominator: 3 });
    }

    #[test]
    fn bad_tempo_uses_default() {
        assert_close(beat_seconds(0.0), 0.5);
        assert_close(beat_seconds(f64::NAN), 0.5);
        assert_close(beat_seconds(90.0), 60.0 / 90.0);
    }
}
