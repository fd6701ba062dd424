//! Packing engine orchestrator.
//!
//! Greedy first-fit placement for flow cells, capacity growth, and
//! reservation re-settlement. Implementation lives in the private `core`
//! module.

mod core;

pub use core::{PackingEngine, PassState};
