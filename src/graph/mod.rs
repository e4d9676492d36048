//! Fixed stereo bus topology voices render into.
//!
//! There is no general graph builder here: the routing is a small, known
//! tree of gain stages, and each gain stage is an automation timeline so the
//! gate and the sidechain duck can schedule against it.

/// Bus buffers, gains and the mixdown.
pub mod bus;
/// Per-block render context.
pub mod node;

pub use bus::{BusGraph, BusId};
pub use node::RenderCtx;
