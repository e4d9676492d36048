use rand::{seq::SliceRandom, Rng};

use crate::sequencing::NoteValue;

/// Cycle order for the periodic gate.
///
/// `working` is always a permutation of `base`; shuffling reorders it and
/// never adds or drops entries.
#[derive(Debug, Clone, PartialEq)]
pub struct GateSequence {
    base: Vec<NoteValue>,
    working: Vec<NoteValue>,
    cursor: usize,
    random: bool,
}

impl GateSequence {
    pub fn new(base: Vec<NoteValue>, random: bool) -> Self {
        Self {
            working: base.clone(),
            base,
            cursor: 0,
            random,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn base(&self) -> &[NoteValue] {
        &self.base
    }

    pub fn working(&self) -> &[NoteValue] {
        &self.working
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewind to the first cycle, shuffling first in random mode.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.random {
            self.shuffle(rng);
        }
        self.cursor = 0;
    }

    /// Fisher-Yates over a fresh copy of the base order.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.working.clear();
        self.working.extend_from_slice(&self.base);
        self.working.shuffle(rng);
    }

    /// Note value for the coming cycle. Random mode reshuffles after every
    /// step, so consecutive cycles never settle into a fixed loop.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<NoteValue> {
        let value = *self.working.get(self.cursor)?;
        self.cursor = (self.cursor + 1) % self.working.len();
        if self.random {
            self.shuffle(rng);
        }
        Some(value)
    }
}
