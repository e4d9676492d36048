#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    gate::GateSettings,
    synth::registry::NoteKey,
    theory::{ChordExtension, DominantRule, HarmonyMode},
};

/// Commands a UI or MIDI thread sends to the audio thread.
///
/// Everything the engine exposes as a method has a message here, so a
/// realtime host can drive the engine without sharing it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    NoteOn {
        key: NoteKey,
        frequency: f32,
        degree: Option<usize>,
    },
    /// Chord on a degree, extensions picked by the harmony mode
    ChordOn { key: NoteKey, degree: usize },
    /// Chord on a degree with explicit extensions
    ChordWith {
        key: NoteKey,
        degree: usize,
        extensions: Vec<ChordExtension>,
    },
    NoteOff { key: NoteKey },
    AllNotesOff,
    PitchBend { key: NoteKey, multiplier: f32 },
    Percussion,
    SetRootFrequency(f32),
    SetTempo(f64),
    SetGateAmount(f32),
    SetGateSequence { tokens: Vec<String>, random: bool },
    SetGateRandom(bool),
    ConfigureGate(GateSettings),
    SetBassDoubling(bool),
    SetHarmony { mode: HarmonyMode, rule: DominantRule },
}

pub trait MessageReceiver: Send {
    fn pop(&mut self) -> Option<ControlMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<ControlMessage> {
    fn pop(&mut self) -> Option<ControlMessage> {
        Consumer::pop(self).ok()
    }
}

/// Lock-free single-producer queue into the engine.
#[cfg(feature = "rtrb")]
pub fn control_channel(capacity: usize) -> (Producer<ControlMessage>, Consumer<ControlMessage>) {
    RingBuffer::new(capacity)
}
