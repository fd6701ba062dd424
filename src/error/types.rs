use thiserror::Error;

use crate::cell::CellId;

/// Unified result type for the adaptive grid crate.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors surfaced by the packing engine and rebuild pipeline.
///
/// Only `PlacementExhausted` and `PlacementIncomplete` abort a pass; every
/// other condition is recovered locally (unresolved areas demote the cell to
/// flow, malformed measurements clamp to a one-track span).
#[derive(Debug, Error)]
pub enum GridError {
    /// A rule routed a cell to an area name missing from the area map.
    #[error("cell `{cell}` classified to unknown area `{area}`")]
    UnresolvedArea { cell: CellId, area: String },
    /// The free-position search failed even after the growth-iteration cap.
    #[error("no position for cell `{cell}` after {growth_steps} growth steps")]
    PlacementExhausted { cell: CellId, growth_steps: usize },
    /// A cell survived `place_all` without a position. Contract violation.
    #[error("cell `{cell}` left unplaced after a settled pass")]
    PlacementIncomplete { cell: CellId },
    /// A rebuild was requested while one was already running.
    #[error("rebuild already in progress")]
    RebuildInProgress,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
