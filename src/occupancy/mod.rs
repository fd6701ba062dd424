//! Occupancy register orchestrator.
//!
//! The register is the authoritative record of rectangles placed during the
//! current pass. Implementation lives in the private `core` module.

mod core;

pub use core::{OccupancyEntry, OccupancyRegister};
