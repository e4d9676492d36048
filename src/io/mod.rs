// Purpose - output buffers handed to the engine by the host

/// Planar output, one buffer per channel.
#[derive(Debug, Default)]
pub struct AudioOutput {
    pub buffers: Vec<Vec<f32>>,
}

impl AudioOutput {
    pub fn stereo(frames: usize) -> Self {
        let mut output = Self::default();
        output.prepare(2, frames);
        output
    }

    /// Make room for `channels × frames` samples, zeroed.
    ///
    /// Only allocates when the shape grows.
    pub fn prepare(&mut self, channels: usize, frames: usize) {
        self.buffers.resize_with(channels, Vec::new);
        for buffer in &mut self.buffers {
            buffer.resize(frames, 0.0);
            buffer.fill(0.0);
        }
    }

    pub fn frames(&self) -> usize {
        self.buffers.first().map_or(0, Vec::len)
    }

    /// Left and right buffers, sized to `frames`.
    pub fn stereo_mut(&mut self, frames: usize) -> (&mut [f32], &mut [f32]) {
        self.prepare(2, frames);
        let (left, right) = self.buffers.split_at_mut(1);
        (&mut left[0][..], &mut right[0][..])
    }

    /// Interleave into a device buffer with `channels` channels.
    ///
    /// Channels beyond the ones held here repeat the last one, so a stereo
    /// engine still fills a 4-channel device.
    pub fn interleave_into(&self, out: &mut [f32], channels: usize) {
        if channels == 0 || self.buffers.is_empty() {
            out.fill(0.0);
            return;
        }
        let last = self.buffers.len() - 1;
        for (frame, samples) in out.chunks_mut(channels).enumerate() {
            for (ch, sample) in samples.iter_mut().enumerate() {
                *sample = self.buffers[ch.min(last)].get(frame).copied().unwrap_or(0.0);
            }
        }
    }
}
