//! Offline render of the demo to a WAV file.

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use hound::{SampleFormat, WavSpec, WavWriter};
use ripple_dsp::{io::AudioOutput, EngineConfig, RippleEngine, MAX_BLOCK_SIZE};
use tracing::{info, warn};

use super::demo::Demo;

/// Seconds rendered after the last release so tails ring out.
const TAIL: f64 = 1.5;

pub fn bounce(config: EngineConfig, demo: &mut Demo, output: &Path, block_size: usize) -> Result<()> {
    let sample_rate = config.sample_rate;
    let block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
    let mut engine = RippleEngine::new(config);

    let spec = WavSpec {
        channels: 2,
        sample_rate: sample_rate as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(output, spec)
        .wrap_err_with(|| format!("failed to create {}", output.display()))?;

    let total_frames = ((demo.length() + TAIL) * sample_rate as f64).ceil() as usize;
    let mut block = AudioOutput::stereo(block_size);
    let mut interleaved = vec![0.0f32; block_size * 2];
    let mut written = 0;
    let mut peak = 0.0f32;

    while written < total_frames {
        let frames = (total_frames - written).min(block_size);
        let block_end = engine.now() + frames as f64 / sample_rate as f64;
        for message in demo.due(block_end) {
            if let Err(err) = engine.handle_message(message) {
                warn!(%err, "demo event failed");
            }
        }

        engine.process_block(frames, &mut block);
        let samples = &mut interleaved[..frames * 2];
        block.interleave_into(samples, 2);
        for &sample in samples.iter() {
            peak = peak.max(sample.abs());
            writer.write_sample(sample).wrap_err("failed to write sample")?;
        }
        written += frames;
    }

    writer.finalize().wrap_err("failed to finalize WAV")?;
    info!(
        path = %output.display(),
        seconds = written as f64 / sample_rate as f64,
        peak,
        "bounce complete"
    );
    Ok(())
}
