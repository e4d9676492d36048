//! Note/chord lifecycle.
//!
//! The registry maps a caller-chosen [`NoteKey`] to the voices sounding for
//! it. A key has at most one entry: triggering a key that is already sounding
//! releases the old entry first, then creates the new one. Released voices are
//! moved to a tail list and keep rendering until their release window has
//! passed.
//!
//! Creation is all-or-nothing. Every voice of a chord is created before any of
//! them is started; if one fails, the others are dropped unheard and the error
//! is returned.

use std::{collections::BTreeMap, fmt};

use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    graph::{BusGraph, RenderCtx},
    synth::{
        factory::{VoiceError, VoiceFactory},
        voice::Voice,
    },
    theory::{ChordExtension, TheoryError, Tuning},
};

/// Widest pan any chord voice is given, either side of centre.
pub const MAX_STEREO_SPREAD: f32 = 0.3;

/// Offset MIDI keys live at, above every Unicode scalar value.
const MIDI_KEY_BASE: u32 = 0x0020_0000;

/// Opaque caller identity for a sounding note or chord.
///
/// Keyboard input uses the key's character, MIDI input the note number;
/// the two ranges never collide.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey(pub u32);

impl NoteKey {
    pub fn midi(note: u8) -> Self {
        NoteKey(MIDI_KEY_BASE + note as u32)
    }
}

impl From<u32> for NoteKey {
    fn from(value: u32) -> Self {
        NoteKey(value)
    }
}

impl From<char> for NoteKey {
    fn from(c: char) -> Self {
        NoteKey(c as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRole {
    /// Note or chord tone, from the melodic factory
    Tone,
    /// Doubled bass an octave under the degree, from the bass factory
    Bass,
}

pub struct EntryVoice {
    voice: Box<dyn Voice>,
    frequency: f32,
    level: f32,
    pan: f32,
    role: VoiceRole,
}

impl EntryVoice {
    pub fn voice(&self) -> &dyn Voice {
        self.voice.as_ref()
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn role(&self) -> VoiceRole {
        self.role
    }
}

pub struct NoteEntry {
    voices: Vec<EntryVoice>,
    degree: Option<usize>,
    started_at: f64,
}

impl NoteEntry {
    /// Chord tones in chord order, then the bass voice if any.
    pub fn voices(&self) -> &[EntryVoice] {
        &self.voices
    }

    pub fn frequencies(&self) -> Vec<f32> {
        self.voices.iter().map(EntryVoice::frequency).collect()
    }

    pub fn has_bass(&self) -> bool {
        self.voices.iter().any(|v| v.role == VoiceRole::Bass)
    }

    pub fn degree(&self) -> Option<usize> {
        self.degree
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrySettings {
    /// Level of a single note at the root frequency
    pub note_gain: f32,
    /// Level of each chord tone at the root frequency
    pub chord_gain: f32,
    /// Level of the doubled bass at the root frequency
    pub bass_gain: f32,
    /// Ceiling for any voice level after the loudness curve
    pub max_gain: f32,
    /// Chord pan spread, clamped to `MAX_STEREO_SPREAD`
    pub stereo_spread: f32,
    /// Add a bass voice half the degree frequency under notes and chords
    pub bass_doubling: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            note_gain: 0.3,
            chord_gain: 0.16,
            bass_gain: 0.2,
            max_gain: 0.6,
            stereo_spread: MAX_STEREO_SPREAD,
            bass_doubling: false,
        }
    }
}

/// Loudness curve: `base_gain × sqrt(root / frequency)`, capped at `max_gain`.
///
/// Unity (times `base_gain`) at the root, louder below it so low notes are
/// not perceived as quieter than high ones. The cap keeps notes far below the
/// root (under about root/4 at the default gains) from clipping the bus.
pub fn level_for(base_gain: f32, root_frequency: f32, frequency: f32, max_gain: f32) -> f32 {
    let level = base_gain * (root_frequency / frequency).sqrt();
    if level.is_finite() {
        level.clamp(0.0, max_gain.max(0.0))
    } else {
        0.0
    }
}

/// Evenly spaced pans from `-spread` to `+spread`; a single voice is centred.
pub fn spread_pans(count: usize, spread: f32) -> Vec<f32> {
    let spread = spread.clamp(0.0, MAX_STEREO_SPREAD);
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| spread * (2.0 * i as f32 / (n - 1) as f32 - 1.0))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    Theory(TheoryError),
    Voice(VoiceError),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::Theory(err) => write!(f, "cannot resolve note: {err}"),
            SynthError::Voice(err) => write!(f, "cannot create voice: {err}"),
        }
    }
}

impl std::error::Error for SynthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynthError::Theory(err) => Some(err),
            SynthError::Voice(err) => Some(err),
        }
    }
}

impl From<TheoryError> for SynthError {
    fn from(err: TheoryError) -> Self {
        SynthError::Theory(err)
    }
}

impl From<VoiceError> for SynthError {
    fn from(err: VoiceError) -> Self {
        SynthError::Voice(err)
    }
}

pub struct NoteRegistry {
    entries: BTreeMap<NoteKey, NoteEntry>,
    releasing: Vec<Box<dyn Voice>>,
    melodic: Box<dyn VoiceFactory>,
    bass: Box<dyn VoiceFactory>,
    settings: RegistrySettings,
}

impl NoteRegistry {
    pub fn new(melodic: Box<dyn VoiceFactory>, bass: Box<dyn VoiceFactory>, settings: RegistrySettings) -> Self {
        Self {
            entries: BTreeMap::new(),
            releasing: Vec::new(),
            melodic,
            bass,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Only affects notes triggered afterwards.
    pub fn set_settings(&mut self, settings: RegistrySettings) {
        self.settings = settings;
    }

    pub fn bass_doubling(&self) -> bool {
        self.settings.bass_doubling
    }

    pub fn set_bass_doubling(&mut self, enabled: bool) {
        self.settings.bass_doubling = enabled;
    }

    /// Sound one voice at `frequency`, plus a bass voice under `degree` when
    /// bass doubling is on.
    pub fn start_note(
        &mut self,
        frequency: f32,
        key: NoteKey,
        degree: Option<usize>,
        tuning: &Tuning,
        now: f64,
    ) -> Result<(), SynthError> {
        if let Some(index) = degree {
            tuning.degree(index)?;
        }
        self.release(key, now);

        let mut voices = Vec::with_capacity(2);
        voices.push(self.create(VoiceRole::Tone, frequency, self.settings.note_gain, 0.0, tuning, now)?);
        if let Some(bass) = self.create_bass(degree, tuning, now)? {
            voices.push(bass);
        }
        self.commit(key, voices, degree, now);
        Ok(())
    }

    /// Sound the triad of `degree` plus `extensions`, spread across the stereo field.
    pub fn start_chord(
        &mut self,
        degree: usize,
        key: NoteKey,
        extensions: &[ChordExtension],
        tuning: &Tuning,
        now: f64,
    ) -> Result<(), SynthError> {
        let frequencies = tuning.degree_chord(degree, extensions)?;
        self.release(key, now);

        let pans = spread_pans(frequencies.len(), self.settings.stereo_spread);
        let mut voices = Vec::with_capacity(frequencies.len() + 1);
        for (&frequency, &pan) in frequencies.iter().zip(&pans) {
            voices.push(self.create(VoiceRole::Tone, frequency, self.settings.chord_gain, pan, tuning, now)?);
        }
        if let Some(bass) = self.create_bass(Some(degree), tuning, now)? {
            voices.push(bass);
        }
        self.commit(key, voices, Some(degree), now);
        Ok(())
    }

    /// Stop every voice of `key`. Unknown keys are ignored.
    pub fn release(&mut self, key: NoteKey, now: f64) {
        let Some(entry) = self.entries.remove(&key) else {
            trace!(?key, "release of inactive key");
            return;
        };
        trace!(?key, voices = entry.voices.len(), "release");
        for mut slot in entry.voices {
            slot.voice.stop(now);
            self.releasing.push(slot.voice);
        }
    }

    pub fn release_all(&mut self, now: f64) {
        let entries = std::mem::take(&mut self.entries);
        if !entries.is_empty() {
            debug!(entries = entries.len(), "release all");
        }
        for (_, entry) in entries {
            for mut slot in entry.voices {
                slot.voice.stop(now);
                self.releasing.push(slot.voice);
            }
        }
    }

    /// Bend every voice of `key` that has a base frequency.
    pub fn update_pitch_bend(&mut self, key: NoteKey, multiplier: f32, now: f64) {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            trace!(?key, multiplier, "ignoring invalid pitch bend");
            return;
        }
        let Some(entry) = self.entries.get_mut(&key) else {
            trace!(?key, "bend of inactive key");
            return;
        };
        for slot in &mut entry.voices {
            if slot.voice.base_frequency().is_some() {
                slot.voice.update_pitch(multiplier, now);
            }
        }
    }

    pub fn is_active(&self, key: NoteKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn entry(&self, key: NoteKey) -> Option<&NoteEntry> {
        self.entries.get(&key)
    }

    pub fn voice_count(&self, key: NoteKey) -> usize {
        self.entries.get(&key).map_or(0, |entry| entry.voices.len())
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_keys(&self) -> impl Iterator<Item = NoteKey> + '_ {
        self.entries.keys().copied()
    }

    /// Voices released but still inside their release window.
    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    /// Every voice that may still produce sound.
    pub fn sounding_voices(&self) -> usize {
        self.entries.values().map(|e| e.voices.len()).sum::<usize>() + self.releasing.len()
    }

    /// Render held and releasing voices into their buses, then drop released
    /// voices whose window ends within this block.
    pub fn render(&mut self, buses: &mut BusGraph, ctx: &RenderCtx) {
        for entry in self.entries.values_mut() {
            for slot in &mut entry.voices {
                let (left, right) = buses.channels_mut(slot.voice.bus());
                slot.voice.render(left, right, ctx);
            }
        }
        for voice in &mut self.releasing {
            let (left, right) = buses.channels_mut(voice.bus());
            voice.render(left, right, ctx);
        }

        let end = ctx.end_time(buses.frames());
        let before = self.releasing.len();
        self.releasing.retain(|voice| voice.is_sounding(end));
        let freed = before - self.releasing.len();
        if freed > 0 {
            trace!(freed, "voices finished releasing");
        }
    }

    fn create(
        &self,
        role: VoiceRole,
        frequency: f32,
        base_gain: f32,
        pan: f32,
        tuning: &Tuning,
        now: f64,
    ) -> Result<EntryVoice, SynthError> {
        let factory = match role {
            VoiceRole::Tone => &self.melodic,
            VoiceRole::Bass => &self.bass,
        };
        let mut voice = factory.create_voice(frequency)?;
        let level = level_for(base_gain, tuning.root_frequency(), frequency, self.settings.max_gain);
        voice.set_level(level, now);
        voice.set_pan(pan);
        Ok(EntryVoice {
            voice,
            frequency,
            level,
            pan,
            role,
        })
    }

    fn create_bass(&self, degree: Option<usize>, tuning: &Tuning, now: f64) -> Result<Option<EntryVoice>, SynthError> {
        let Some(index) = degree.filter(|_| self.settings.bass_doubling) else {
            return Ok(None);
        };
        let frequency = tuning.scale_note_frequency(index, 0)? * 0.5;
        self.create(VoiceRole::Bass, frequency, self.settings.bass_gain, 0.0, tuning, now)
            .map(Some)
    }

    fn commit(&mut self, key: NoteKey, mut voices: Vec<EntryVoice>, degree: Option<usize>, now: f64) {
        for slot in &mut voices {
            slot.voice.start(now);
        }
        debug!(?key, ?degree, voices = voices.len(), "note on");
        self.entries.insert(
            key,
            NoteEntry {
                voices,
                degree,
                started_at: now,
            },
        );
    }
}
