//! Bus-level gain shaping.
//!
//! Two independent mechanisms live here. The periodic gate chops a bus in
//! time with the tempo; the sidechain duck dips buses on every percussion
//! hit. Neither ever touches an individual voice.

/// Gain curve for one gate cycle.
pub mod curve;
/// Tempo-synced gate state machine.
pub mod periodic;
/// Cycle order, optionally shuffled.
pub mod sequence;
/// One-shot duck per percussion hit.
pub mod sidechain;

pub use curve::gate_curve;
pub use periodic::{GateEnv, GateSettings, GateState, GateTick, PeriodicGate};
pub use sequence::GateSequence;
pub use sidechain::DuckEnvelope;
