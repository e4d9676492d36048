//! ripple - play or bounce the demo progression
//!
//! Run with: cargo run -- play
//!       or: cargo run -- bounce out.wav

mod app;
mod bounce;
mod demo;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use ripple_dsp::{
    engine::{MAX_TEMPO, MIN_TEMPO},
    gate::GateSettings,
    sequencing::DEFAULT_BPM,
    theory::{DominantRule, HarmonyMode},
    EngineConfig,
};
use tracing_subscriber::EnvFilter;

use demo::Demo;

#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Tempo-gated just-intonation chords", long_about = None)]
struct Cli {
    /// Engine config (TOML); flags below override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tempo in BPM
    #[arg(short, long, global = true)]
    tempo: Option<f64>,

    /// Gate depth, 0-100
    #[arg(short, long, global = true)]
    gate: Option<f32>,

    /// Gate note values, comma separated (e.g. 8,8,4T)
    #[arg(short, long, global = true, value_delimiter = ',')]
    sequence: Option<Vec<String>>,

    /// Reshuffle the gate sequence every cycle
    #[arg(long, global = true)]
    random: bool,

    /// Double chords with a sub bass
    #[arg(long, global = true)]
    bass: bool,

    /// diatonic, jazz7, jazz79 or jazz13
    #[arg(long, global = true, value_parser = parse_harmony)]
    harmony: Option<HarmonyMode>,

    /// Use the harmonic-function table for sevenths instead of fixed Sol positions
    #[arg(long, global = true)]
    functional: bool,

    /// Seed for the gate shuffle
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo on the default output device
    Play {
        /// Bars of the progression to play
        #[arg(short, long, default_value = "8")]
        bars: u32,
    },
    /// Render the demo to a WAV file
    Bounce {
        /// Output WAV file path
        output: PathBuf,

        /// Bars of the progression to render
        #[arg(short, long, default_value = "8")]
        bars: u32,

        /// Sample rate in Hz
        #[arg(short = 'r', long, default_value = "48000")]
        sample_rate: u32,

        /// Block size for processing
        #[arg(long, default_value = "512")]
        block_size: usize,
    },
}

fn parse_harmony(name: &str) -> Result<HarmonyMode, String> {
    match name.to_ascii_lowercase().as_str() {
        "diatonic" => Ok(HarmonyMode::Diatonic),
        "jazz7" => Ok(HarmonyMode::Jazz7),
        "jazz79" => Ok(HarmonyMode::Jazz79),
        "jazz13" => Ok(HarmonyMode::Jazz13),
        other => Err(format!("unknown harmony mode '{other}'")),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).wrap_err_with(|| format!("invalid config {}", path.display()))
}

impl Cli {
    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(tempo) = self.tempo {
            config.tempo = Some(tempo);
        }
        if self.gate.is_some() || self.sequence.is_some() || self.random {
            let current = config.gate.clone();
            config.gate = GateSettings {
                amount_percent: self.gate.unwrap_or(current.amount_percent),
                sequence: self.sequence.clone().unwrap_or(current.sequence),
                random: self.random || current.random,
            };
        }
        if self.bass {
            config.voices.bass_doubling = true;
        }
        if let Some(mode) = self.harmony {
            config.harmony = mode;
        }
        if self.functional {
            config.dominant_rule = DominantRule::Functional;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(load_config(cli.config.as_deref())?);
    let bpm = config.tempo.unwrap_or(DEFAULT_BPM).clamp(MIN_TEMPO, MAX_TEMPO);

    match cli.command {
        Commands::Play { bars } => app::play(config, Demo::progression(bars, bpm)),
        Commands::Bounce {
            output,
            bars,
            sample_rate,
            block_size,
        } => {
            let config = config.sample_rate(sample_rate as f32);
            let mut demo = Demo::progression(bars, bpm);
            bounce::bounce(config, &mut demo, &output, block_size)
        }
    }
}
