/*
Note-Value Tokens
=================

The gate is configured with short strings naming note values:

  "1"   whole note        4 beats
  "2"   half note         2 beats
  "4"   quarter note      1 beat
  "8"   eighth note       1/2 beat
  "16"  sixteenth note    1/4 beat
  "64"  shortest accepted 1/16 beat

Anything finer than a sixty-fourth is rejected: at the top tempo it would
be a handful of samples long and the gate would spend the block
rescheduling itself.

A trailing "T" makes a triplet. Only four triplets exist, and they are a
lookup table rather than a general rule:

  "8T"  beat / 3
  "4T"  beat * 2/3
  "2T"  beat * 4/3
  "1T"  beat * 8/3

At 120 BPM one beat is 0.5s, so "4" = 0.5s, "8T" ≈ 0.1667s, "4T" ≈ 0.3333s
and "1T" ≈ 1.3333s.
*/

use std::fmt;
use std::str::FromStr;

use super::duration::{beat_seconds, Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteValue {
    /// `1/N` of a whole note
    Straight(u32),
    /// One of the four supported triplets, stored by its straight denominator
    Triplet(u32),
}

const TRIPLET_DENOMINATORS: [u32; 4] = [1, 2, 4, 8];

/// Largest plain denominator, a sixty-fourth note.
pub const MAX_DENOMINATOR: u32 = 64;

impl NoteValue {
    pub fn parse(token: &str) -> Result<Self, NoteValueError> {
        let token = token.trim();
        let (digits, triplet) = match token.strip_suffix(&['T', 't'][..]) {
            Some(digits) => (digits, true),
            None => (token, false),
        };

        let denominator: u32 = digits
            .parse()
            .map_err(|_| NoteValueError::Malformed(token.to_string()))?;
        if denominator == 0 || denominator > MAX_DENOMINATOR {
            return Err(NoteValueError::Malformed(token.to_string()));
        }

        if triplet {
            if !TRIPLET_DENOMINATORS.contains(&denominator) {
                return Err(NoteValueError::UnsupportedTriplet(denominator));
            }
            Ok(NoteValue::Triplet(denominator))
        } else {
            Ok(NoteValue::Straight(denominator))
        }
    }

    /// Parse every token, failing on the first bad one.
    pub fn parse_sequence<I, S>(tokens: I) -> Result<Vec<NoteValue>, NoteValueError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens.into_iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    pub fn duration(&self) -> Duration {
        match *self {
            NoteValue::Straight(n) => Duration::of(n),
            NoteValue::Triplet(n) => Duration::of(n).triplet().reduce(),
        }
    }

    /// Length in seconds at `bpm`.
    pub fn seconds(&self, bpm: f64) -> f64 {
        let beat = beat_seconds(bpm);
        match *self {
            NoteValue::Straight(n) => beat * 4.0 / n as f64,
            NoteValue::Triplet(8) => beat / 3.0,
            NoteValue::Triplet(4) => beat * 2.0 / 3.0,
            NoteValue::Triplet(2) => beat * 4.0 / 3.0,
            NoteValue::Triplet(1) => beat * 8.0 / 3.0,
            // parse() never builds other triplets
            NoteValue::Triplet(_) => self.duration().beats() * beat,
        }
    }
}

/// Duration in seconds of a note-value token at `bpm`.
pub fn note_duration(token: &str, bpm: f64) -> Result<f64, NoteValueError> {
    NoteValue::parse(token).map(|value| value.seconds(bpm))
}

impl FromStr for NoteValue {
    type Err = NoteValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteValue::parse(s)
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteValue::Straight(n) => write!(f, "{}", n),
            NoteValue::Triplet(n) => write!(f, "{}T", n),
        }
    }
}

/// Errors that can occur when parsing a note-value token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValueError {
    /// Not an integer in `1..=64` with an optional `T` suffix
    Malformed(String),
    /// Triplet of a note value outside 1, 2, 4, 8
    UnsupportedTriplet(u32),
}

impl fmt::Display for NoteValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteValueError::Malformed(token) => write!(f, "Malformed note value {:?}", token),
            NoteValueError::UnsupportedTriplet(n) => {
                write!(f, "Unsupported triplet {}T (expected 1T, 2T, 4T or 8T)", n)
            }
        }
    }
}

impl std::error::Error for NoteValueError {}
