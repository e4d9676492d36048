//! Live playback through the default output device

use std::{thread, time::Duration, time::Instant};

use color_eyre::eyre::{eyre, Result, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ripple_dsp::{io::AudioOutput, synth::message::control_channel, EngineConfig, RippleEngine, MAX_BLOCK_SIZE};
use tracing::{info, warn};

use super::demo::Demo;

/// Control queue depth; the demo never has more than a few events in flight.
const QUEUE_CAPACITY: usize = 256;

/// Seconds to keep the stream open after the last release.
const TAIL: f64 = 1.5;

pub fn play(mut config: EngineConfig, mut demo: Demo) -> Result<()> {
    // Set up audio
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let stream_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = stream_config.sample_rate().0 as f32;
    let channels = stream_config.channels() as usize;
    config.sample_rate = sample_rate;

    info!(sample_rate, channels, tempo = ?config.tempo, "starting playback");

    let (mut tx, rx) = control_channel(QUEUE_CAPACITY);
    let mut engine = RippleEngine::new(config).with_receiver(rx);
    let mut block = AudioOutput::stereo(MAX_BLOCK_SIZE);

    let stream = device.build_output_stream(
        &stream_config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                engine.process_block(frames_to_render, &mut block);

                let out_off = frames_written * channels;
                let out = &mut data[out_off..out_off + frames_to_render * channels];
                block.interleave_into(out, channels);

                frames_written += frames_to_render;
            }
        },
        |err| warn!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;

    // The demo clock is wall time; events land on the next audio block.
    let started = Instant::now();
    while !demo.is_finished() {
        let now = started.elapsed().as_secs_f64();
        for message in demo.due(now) {
            if tx.push(message).is_err() {
                warn!("control queue full, dropping event");
            }
        }
        let wait = demo.next_at().map_or(0.0, |at| (at - now).max(0.0)).min(0.05);
        thread::sleep(Duration::from_secs_f64(wait.max(0.001)));
    }

    thread::sleep(Duration::from_secs_f64(TAIL));
    info!(seconds = started.elapsed().as_secs_f64(), "playback finished");
    Ok(())
}
