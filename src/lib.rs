//! Adaptive grid packing engine.
//!
//! Computes a dense, non-overlapping grid placement for a dynamic set of
//! variable-sized cells. Flow cells pack greedily, tallest first;
//! reservation cells pin to named edge/corner areas that track the grid as
//! it grows. External collaborators feed cell-set deltas in and receive
//! final column/row coordinates out; everything in between — intake,
//! classification, occupancy, packing, growth, anchor re-resolution — lives
//! here.

pub mod area;
pub mod cell;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod metrics;
pub mod occupancy;
pub mod pipeline;
pub mod publish;

pub use area::{
    Area, AreaMap, AreaName, ColumnAnchor, RowAnchor, Rule, RulePredicate, RuleSet, corner_areas,
};
pub use cell::{Cell, CellId, Measurement, SizeToken};
pub use engine::{PackingEngine, PassState};
pub use error::{GridError, Result};
pub use geometry::GridRect;
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, PackingMetrics};
pub use occupancy::{OccupancyEntry, OccupancyRegister};
pub use pipeline::{CellDelta, GridConfig, GridPipeline};
pub use publish::{CellPlacement, GridDimensions, LayoutCapture, PlacementLedger, PlacementSink};
