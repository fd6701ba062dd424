//! Publish module orchestrator.
//!
//! The consumer-side interface boundary: final coordinates per cell and the
//! grid's published dimensions, plus a content-hashed ledger for consumers
//! that only want what changed. Implementation lives in the private `core`
//! module.

mod core;

pub use core::{CellPlacement, GridDimensions, LayoutCapture, PlacementLedger, PlacementSink};
