/// Context passed to voices and buses during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Absolute audio time of the first sample in the block, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Seconds between two samples.
    #[inline]
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    /// Time of sample `offset` within the block.
    #[inline]
    pub fn time_at(&self, offset: usize) -> f64 {
        self.time + offset as f64 * self.sample_period()
    }

    /// Time just past the last sample of a `frames` long block.
    #[inline]
    pub fn end_time(&self, frames: usize) -> f64 {
        self.time_at(frames)
    }
}
