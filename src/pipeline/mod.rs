//! Rebuild pipeline orchestrator.
//!
//! Turns batches of cell-set deltas into a settled, published layout:
//! reset, intake, classify, pack, publish. Implementation lives in the
//! private `core` module.

mod core;

pub use core::{CellDelta, GridConfig, GridPipeline};
