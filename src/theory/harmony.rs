//! Extension-selection policies.
//!
//! Each policy turns a scale-degree index into the extensions stacked on its
//! triad. The dominant degree (Sol) is the interesting case: its triad is
//! major, but in jazz voicing it takes a minor seventh (G7, not Gmaj7).
//!
//! Two ways of spotting the dominant exist and both are kept:
//! [`DominantRule::Positional`] checks for the two Sol positions in the scale
//! table, [`DominantRule::Functional`] reads the harmonic-function table.
//! They agree on the current table but are configured separately.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::scale::{ChordExtension, ChordType, SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicFunction {
    Major,
    Minor,
    Dominant,
}

/// Harmonic function of each entry in [`SCALE`], same indexing.
pub const HARMONIC_FUNCTIONS: [HarmonicFunction; 14] = [
    HarmonicFunction::Minor,    // La
    HarmonicFunction::Minor,    // Ti
    HarmonicFunction::Major,    // Do
    HarmonicFunction::Minor,    // Re
    HarmonicFunction::Minor,    // Mi
    HarmonicFunction::Major,    // Fa
    HarmonicFunction::Dominant, // Sol
    HarmonicFunction::Minor,    // La
    HarmonicFunction::Minor,    // Ti
    HarmonicFunction::Major,    // Do
    HarmonicFunction::Minor,    // Re
    HarmonicFunction::Minor,    // Mi
    HarmonicFunction::Major,    // Fa
    HarmonicFunction::Dominant, // Sol
];

/// Scale positions treated as dominant by [`DominantRule::Positional`].
pub const DOMINANT_POSITIONS: [usize; 2] = [6, 13];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarmonyMode {
    /// Plain triads
    #[default]
    Diatonic,
    /// Triad + seventh
    Jazz7,
    /// Triad + seventh + ninth
    Jazz79,
    /// Full extended voicing, per harmonic function
    Jazz13,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DominantRule {
    #[default]
    Positional,
    Functional,
}

pub fn harmonic_function(index: usize) -> Option<HarmonicFunction> {
    HARMONIC_FUNCTIONS.get(index).copied()
}

impl DominantRule {
    /// The seventh to stack on `index`, or `None` for an unknown degree.
    pub fn seventh_for(self, index: usize) -> Option<ChordExtension> {
        match self {
            DominantRule::Positional => {
                if DOMINANT_POSITIONS.contains(&index) {
                    return Some(ChordExtension::MinorSeventh);
                }
                SCALE.get(index).map(|degree| match degree.chord_type {
                    ChordType::Major => ChordExtension::Seventh,
                    ChordType::Minor => ChordExtension::MinorSeventh,
                })
            }
            DominantRule::Functional => harmonic_function(index).map(|function| match function {
                HarmonicFunction::Major => ChordExtension::Seventh,
                HarmonicFunction::Minor | HarmonicFunction::Dominant => ChordExtension::MinorSeventh,
            }),
        }
    }
}

impl HarmonyMode {
    /// Extensions for `index` under this policy. Unknown degrees get none;
    /// the chord lookup itself reports the bad index.
    pub fn extensions_for(self, index: usize, rule: DominantRule) -> Vec<ChordExtension> {
        match self {
            HarmonyMode::Diatonic => Vec::new(),
            HarmonyMode::Jazz7 => rule.seventh_for(index).into_iter().collect(),
            HarmonyMode::Jazz79 => match rule.seventh_for(index) {
                Some(seventh) => vec![seventh, ChordExtension::Ninth],
                None => Vec::new(),
            },
            HarmonyMode::Jazz13 => match harmonic_function(index) {
                Some(HarmonicFunction::Major) => vec![
                    ChordExtension::Seventh,
                    ChordExtension::Ninth,
                    ChordExtension::Thirteenth,
                ],
                Some(HarmonicFunction::Minor) => vec![
                    ChordExtension::MinorSeventh,
                    ChordExtension::Ninth,
                    ChordExtension::Eleventh,
                ],
                Some(HarmonicFunction::Dominant) => vec![
                    ChordExtension::MinorSeventh,
                    ChordExtension::Ninth,
                    ChordExtension::Thirteenth,
                ],
                None => Vec::new(),
            },
        }
    }
}
