/*
Scale Degrees and Chords
========================

The instrument plays a major scale tuned in just intonation. Each degree is a
fixed ratio against the root (Do), and each degree carries the quality of the
triad built on it.

  idx  name  ratio   triad
  ---  ----  ------  -----
   0   La    5/6     minor     (below the root)
   1   Ti    15/16   minor
   2   Do    1/1     major     <- root
   3   Re    9/8     minor
   4   Mi    5/4     minor
   5   Fa    4/3     major
   6   Sol   3/2     major
   7   La    5/3     minor
   8   Ti    15/8    minor
   9   Do    2/1     major     <- octave
  10   Re    9/4     minor
  11   Mi    5/2     minor
  12   Fa    8/3     major
  13   Sol   3/1     major


Triads
------

A triad is three ratios applied against the degree's own frequency:

  major   1/1  5/4  3/2     (root, major third, fifth)
  minor   1/1  6/5  3/2     (root, minor third, fifth)


Extensions
----------

Extensions stack on top of the triad, also relative to the degree:

  seventh        15/8   major seventh
  minorSeventh    9/5   minor seventh
  ninth           9/4
  eleventh        8/3
  thirteenth     10/3

Chord frequencies always come out triad first (in the order above), then the
requested extensions in the order they were asked for.
*/

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ratio::{frequency_from_ratio, Ratio};

/// Middle C.
pub const DEFAULT_ROOT_FREQUENCY: f32 = 261.63;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordType {
    Major,
    Minor,
}

impl ChordType {
    /// Unknown names fall back to major.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "minor" | "min" | "m" => ChordType::Minor,
            _ => ChordType::Major,
        }
    }

    pub const fn triad(self) -> [Ratio; 3] {
        match self {
            ChordType::Major => [Ratio::UNISON, Ratio::new(5, 4), Ratio::new(3, 2)],
            ChordType::Minor => [Ratio::UNISON, Ratio::new(6, 5), Ratio::new(3, 2)],
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordExtension {
    Seventh,
    MinorSeventh,
    Ninth,
    Eleventh,
    Thirteenth,
}

impl ChordExtension {
    pub const ALL: [ChordExtension; 5] = [
        ChordExtension::Seventh,
        ChordExtension::MinorSeventh,
        ChordExtension::Ninth,
        ChordExtension::Eleventh,
        ChordExtension::Thirteenth,
    ];

    pub const fn ratio(self) -> Ratio {
        match self {
            ChordExtension::Seventh => Ratio::new(15, 8),
            ChordExtension::MinorSeventh => Ratio::new(9, 5),
            ChordExtension::Ninth => Ratio::new(9, 4),
            ChordExtension::Eleventh => Ratio::new(8, 3),
            ChordExtension::Thirteenth => Ratio::new(10, 3),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ChordExtension::Seventh => "seventh",
            ChordExtension::MinorSeventh => "minorSeventh",
            ChordExtension::Ninth => "ninth",
            ChordExtension::Eleventh => "eleventh",
            ChordExtension::Thirteenth => "thirteenth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ext| ext.name() == name)
    }

    /// Parse extension names, silently skipping the ones we don't know.
    pub fn parse_list<I, S>(names: I) -> Vec<ChordExtension>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| Self::from_name(name.as_ref()))
            .collect()
    }
}

impl fmt::Display for ChordExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleDegree {
    pub index: usize,
    pub name: &'static str,
    pub ratio: Ratio,
    pub chord_type: ChordType,
}

const fn degree(index: usize, name: &'static str, num: u32, den: u32, chord_type: ChordType) -> ScaleDegree {
    ScaleDegree {
        index,
        name,
        ratio: Ratio::new(num, den),
        chord_type,
    }
}

pub const SCALE: [ScaleDegree; 14] = [
    degree(0, "La", 5, 6, ChordType::Minor),
    degree(1, "Ti", 15, 16, ChordType::Minor),
    degree(2, "Do", 1, 1, ChordType::Major),
    degree(3, "Re", 9, 8, ChordType::Minor),
    degree(4, "Mi", 5, 4, ChordType::Minor),
    degree(5, "Fa", 4, 3, ChordType::Major),
    degree(6, "Sol", 3, 2, ChordType::Major),
    degree(7, "La", 5, 3, ChordType::Minor),
    degree(8, "Ti", 15, 8, ChordType::Minor),
    degree(9, "Do", 2, 1, ChordType::Major),
    degree(10, "Re", 9, 4, ChordType::Minor),
    degree(11, "Mi", 5, 2, ChordType::Minor),
    degree(12, "Fa", 8, 3, ChordType::Major),
    degree(13, "Sol", 3, 1, ChordType::Major),
];

/// Errors raised by scale lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TheoryError {
    /// Degree index past the end of the scale table
    DegreeOutOfRange { index: usize, len: usize },
}

impl fmt::Display for TheoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryError::DegreeOutOfRange { index, len } => {
                write!(f, "Scale degree {} out of range (scale has {} degrees)", index, len)
            }
        }
    }
}

impl std::error::Error for TheoryError {}

/// Holds the root frequency every lookup is measured against.
///
/// Changing the root only affects frequencies computed afterwards; voices
/// already sounding were given a plain `f32` and never look back here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    root_frequency: f32,
}

impl Tuning {
    pub fn new(root_frequency: f32) -> Self {
        Self { root_frequency }
    }

    pub fn root_frequency(&self) -> f32 {
        self.root_frequency
    }

    pub fn set_root_frequency(&mut self, root_frequency: f32) {
        self.root_frequency = root_frequency;
    }

    pub fn degree(&self, index: usize) -> Result<&'static ScaleDegree, TheoryError> {
        SCALE.get(index).ok_or(TheoryError::DegreeOutOfRange {
            index,
            len: SCALE.len(),
        })
    }

    /// Frequency of a degree, shifted by whole octaves.
    pub fn scale_note_frequency(&self, index: usize, octave_shift: i32) -> Result<f32, TheoryError> {
        let degree = self.degree(index)?;
        Ok(frequency_from_ratio(degree.ratio, self.root_frequency) * 2.0_f32.powi(octave_shift))
    }

    /// Triad for `chord_type` on degree `index`, followed by `extensions` in order.
    pub fn chord_frequencies(
        &self,
        index: usize,
        chord_type: ChordType,
        extensions: &[ChordExtension],
    ) -> Result<Vec<f32>, TheoryError> {
        let degree_frequency = self.scale_note_frequency(index, 0)?;

        let mut frequencies = Vec::with_capacity(3 + extensions.len());
        frequencies.extend(
            chord_type
                .triad()
                .iter()
                .map(|&ratio| frequency_from_ratio(ratio, degree_frequency)),
        );
        frequencies.extend(
            extensions
                .iter()
                .map(|ext| frequency_from_ratio(ext.ratio(), degree_frequency)),
        );
        Ok(frequencies)
    }

    /// Chord on a degree using the degree's own triad quality.
    pub fn degree_chord(&self, index: usize, extensions: &[ChordExtension]) -> Result<Vec<f32>, TheoryError> {
        let degree = self.degree(index)?;
        self.chord_frequencies(index, degree.chord_type, extensions)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_FREQUENCY)
    }
}
