//! Cell model orchestrator.
//!
//! Public cell types are re-exported from here; the intake math lives in the
//! private `core` module.

mod core;

pub use core::{Cell, CellId, IntakeSettings, Measurement, SizeToken};
