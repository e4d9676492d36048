/*
Bus Routing
===========

    melodic voices → [Melodic gain] → [Gate gain] ┐
    bass voices    → [Bass gain] ─────────────────├→ [Master gain] → output
    percussion     → [Percussion gain] ───────────┘

Owners
------

  Melodic, Bass   the sidechain duck (one-shot per percussion hit)
  Gate            the periodic gate
  Percussion      nobody; stays at unity unless a caller moves it
  Master          output level

Voices never touch a bus gain, only their own. Each gain stage is a
`ParamTimeline`, rendered once per block into a gain buffer and multiplied
into the bus before the bus is summed into the next one downstream.

Every downstream bus sorts after its sources in `BusId::ALL`, so a single
forward pass mixes the whole tree.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    automation::{AudioParam, ParamTimeline},
    dsp::mix::{apply_gain_in_place, sum_in_place},
    MAX_BLOCK_SIZE,
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BusId {
    Melodic,
    Bass,
    Percussion,
    Gate,
    Master,
}

impl BusId {
    /// Mixdown order: sources before the bus they feed.
    pub const ALL: [BusId; 5] = [
        BusId::Melodic,
        BusId::Bass,
        BusId::Percussion,
        BusId::Gate,
        BusId::Master,
    ];

    /// Bus this one sums into, `None` for the master output.
    pub fn downstream(self) -> Option<BusId> {
        match self {
            BusId::Melodic => Some(BusId::Gate),
            BusId::Bass | BusId::Percussion | BusId::Gate => Some(BusId::Master),
            BusId::Master => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone)]
struct Bus {
    left: Vec<f32>,
    right: Vec<f32>,
    gain: ParamTimeline,
}

impl Bus {
    fn new() -> Self {
        Self {
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
            gain: ParamTimeline::new(1.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusGraph {
    buses: [Bus; 5],
    gain_buffer: Vec<f32>,
    frames: usize,
}

impl BusGraph {
    pub fn new() -> Self {
        Self {
            buses: std::array::from_fn(|_| Bus::new()),
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frames: 0,
        }
    }

    /// Frames in the block currently being rendered.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Clear every bus for a block of `frames` samples.
    pub fn begin_block(&mut self, frames: usize) {
        debug_assert!(frames <= MAX_BLOCK_SIZE);
        self.frames = frames.min(MAX_BLOCK_SIZE);
        for bus in &mut self.buses {
            bus.left[..self.frames].fill(0.0);
            bus.right[..self.frames].fill(0.0);
        }
    }

    /// Stereo input of a bus for the current block. Voices add into it.
    pub fn channels_mut(&mut self, id: BusId) -> (&mut [f32], &mut [f32]) {
        let frames = self.frames;
        let bus = &mut self.buses[id.index()];
        (&mut bus.left[..frames], &mut bus.right[..frames])
    }

    pub fn channels(&self, id: BusId) -> (&[f32], &[f32]) {
        let bus = &self.buses[id.index()];
        (&bus.left[..self.frames], &bus.right[..self.frames])
    }

    pub fn gain(&self, id: BusId) -> &ParamTimeline {
        &self.buses[id.index()].gain
    }

    pub fn gain_mut(&mut self, id: BusId) -> &mut ParamTimeline {
        &mut self.buses[id.index()].gain
    }

    /// Gains the sidechain duck pulls down on every percussion hit.
    pub fn duck_targets(&mut self) -> [&mut dyn AudioParam; 2] {
        let [melodic, bass, ..] = &mut self.buses;
        [&mut melodic.gain, &mut bass.gain]
    }

    /// Apply every gain stage and sum the tree into `left`/`right`.
    ///
    /// `start_time` is the absolute time of the first sample in the block.
    pub fn mix_to(&mut self, left: &mut [f32], right: &mut [f32], start_time: f64, sample_rate: f32) {
        let frames = self.frames.min(left.len()).min(right.len());
        let gain = &mut self.gain_buffer[..frames];

        for id in BusId::ALL {
            let source = id.index();
            {
                let bus = &mut self.buses[source];
                bus.gain.render_block(gain, start_time, sample_rate);
                apply_gain_in_place(&mut bus.left[..frames], gain);
                apply_gain_in_place(&mut bus.right[..frames], gain);
            }

            match id.downstream() {
                Some(target) => {
                    let (head, tail) = self.buses.split_at_mut(target.index());
                    let (from, to) = (&head[source], &mut tail[0]);
                    sum_in_place(&mut to.left[..frames], &from.left[..frames]);
                    sum_in_place(&mut to.right[..frames], &from.right[..frames]);
                }
                None => {
                    let bus = &self.buses[source];
                    left[..frames].copy_from_slice(&bus.left[..frames]);
                    right[..frames].copy_from_slice(&bus.right[..frames]);
                }
            }
        }
    }
}

impl Default for BusGraph {
    fn default() -> Self {
        Self::new()
    }
}
