use std::fmt;

use crate::synth::voice::Voice;

/// Factory for creating voices with a specific patch/sound design
///
/// This is the "instrument design" layer - you configure your sound once,
/// including the bus it plays into, then the registry asks the factory for
/// one voice per frequency.
pub trait VoiceFactory: Send {
    fn create_voice(&self, frequency: f32) -> Result<Box<dyn Voice>, VoiceError>;
}

impl<F> VoiceFactory for F
where
    F: Fn(f32) -> Result<Box<dyn Voice>, VoiceError> + Send,
{
    fn create_voice(&self, frequency: f32) -> Result<Box<dyn Voice>, VoiceError> {
        self(frequency)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceError {
    /// Zero, negative or non-finite frequency
    InvalidFrequency { frequency: f32 },
    /// Frequency at or above half the sample rate
    AboveNyquist { frequency: f32, nyquist: f32 },
    /// The factory could not produce a voice for another reason
    Unavailable(String),
}

impl fmt::Display for VoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceError::InvalidFrequency { frequency } => {
                write!(f, "invalid voice frequency {frequency} Hz")
            }
            VoiceError::AboveNyquist { frequency, nyquist } => {
                write!(f, "voice frequency {frequency} Hz is above Nyquist ({nyquist} Hz)")
            }
            VoiceError::Unavailable(reason) => write!(f, "voice unavailable: {reason}"),
        }
    }
}

impl std::error::Error for VoiceError {}

/// Check a requested frequency against the sample rate.
pub fn validate_frequency(frequency: f32, sample_rate: f32) -> Result<f32, VoiceError> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(VoiceError::InvalidFrequency { frequency });
    }
    let nyquist = sample_rate * 0.5;
    if frequency >= nyquist {
        return Err(VoiceError::AboveNyquist { frequency, nyquist });
    }
    Ok(frequency)
}
