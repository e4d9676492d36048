//! Scheduled parameter changes against a sample-counting audio clock.

/// Sample-counting clock.
pub mod clock;
/// Parameter automation timelines.
pub mod param;

pub use clock::{AudioClock, SampleClock};
pub use param::{exp_safe, AudioParam, ParamTimeline};
