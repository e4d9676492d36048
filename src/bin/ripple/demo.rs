//! Demo progression: one chord per bar, kick on beats 1 and 3.

use ripple_dsp::{
    sequencing::beat_seconds,
    synth::{ControlMessage, NoteKey},
};

/// Do - La - Fa - Sol
const PROGRESSION: [usize; 4] = [2, 7, 5, 6];
const BEATS_PER_BAR: u32 = 4;
const CHORD_KEY: NoteKey = NoteKey(1);

#[derive(Debug, Clone)]
pub struct DemoEvent {
    pub at: f64,
    pub message: ControlMessage,
}

/// Timeline of control messages, consumed in time order.
pub struct Demo {
    events: Vec<DemoEvent>,
    cursor: usize,
    length: f64,
}

impl Demo {
    pub fn progression(bars: u32, bpm: f64) -> Self {
        let beat = beat_seconds(bpm);
        let mut events = Vec::new();

        for bar in 0..bars {
            let bar_start = (bar * BEATS_PER_BAR) as f64 * beat;
            let degree = PROGRESSION[bar as usize % PROGRESSION.len()];
            // same key every bar, so each chord replaces the last
            events.push(DemoEvent {
                at: bar_start,
                message: ControlMessage::ChordOn {
                    key: CHORD_KEY,
                    degree,
                },
            });
            for kick in [0, 2] {
                events.push(DemoEvent {
                    at: bar_start + kick as f64 * beat,
                    message: ControlMessage::Percussion,
                });
            }
        }

        let length = (bars * BEATS_PER_BAR) as f64 * beat;
        events.push(DemoEvent {
            at: length,
            message: ControlMessage::AllNotesOff,
        });
        events.sort_by(|a, b| a.at.total_cmp(&b.at));

        Self {
            events,
            cursor: 0,
            length,
        }
    }

    /// Seconds until the final release.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.events.len()
    }

    /// Start time of the next pending event.
    pub fn next_at(&self) -> Option<f64> {
        self.events.get(self.cursor).map(|event| event.at)
    }

    /// Every event due before `until`.
    pub fn due(&mut self, until: f64) -> impl Iterator<Item = ControlMessage> + '_ {
        let start = self.cursor;
        while self.cursor < self.events.len() && self.events[self.cursor].at < until {
            self.cursor += 1;
        }
        self.events[start..self.cursor].iter().map(|event| event.message.clone())
    }
}
