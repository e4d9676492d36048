//! Built-in voices.
//!
//! Each voice comes with a factory that is told, at construction, which bus
//! its voices play into.
//!
//! # Example
//!
//! ```ignore
//! use ripple_dsp::{graph::BusId, voices};
//!
//! let pads = voices::PadFactory::new(BusId::Melodic, 48_000.0, Default::default());
//! let subs = voices::SubBassFactory::new(BusId::Bass, 48_000.0, Default::default());
//! ```

mod bass;
mod pad;

pub use bass::{SubBassFactory, SubBassSettings, SubBassVoice};
pub use pad::{PadFactory, PadSettings, PadVoice};
