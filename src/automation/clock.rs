/// Source of "now" on the audio timeline, in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// Clock driven by the number of frames rendered so far.
///
/// Time only moves when a block is rendered, so everything scheduled against
/// it is sample accurate and offline renders are deterministic.
#[derive(Debug, Clone)]
pub struct SampleClock {
    sample_rate: f32,
    frames: u64,
}

impl SampleClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn advance(&mut self, frames: usize) {
        self.frames += frames as u64;
    }

    /// Time of the frame `offset` frames from now.
    pub fn time_at_offset(&self, offset: usize) -> f64 {
        (self.frames + offset as u64) as f64 / self.sample_rate as f64
    }
}

impl AudioClock for SampleClock {
    fn now(&self) -> f64 {
        self.time_at_offset(0)
    }
}
