pub mod duration;
pub mod note_value;

pub use duration::{beat_seconds, Duration, DEFAULT_BPM};
pub use note_value::{note_duration, NoteValue, NoteValueError, MAX_DENOMINATOR};
