// Purpose: Voice contract, note/chord lifecycle, control messages
// This layer sits above the bus graph and decides which voices sound

pub mod factory;
pub mod message;
pub mod registry;
pub mod voice;

pub use factory::{validate_frequency, VoiceError, VoiceFactory};
pub use message::{ControlMessage, MessageReceiver};
pub use registry::{NoteEntry, NoteKey, NoteRegistry, RegistrySettings, SynthError, VoiceRole};
pub use voice::{Voice, VoiceEnvelope, VoiceState};
