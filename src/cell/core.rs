use serde::{Deserialize, Serialize};

use crate::area::AreaName;
use crate::geometry::GridRect;

/// Opaque identity of the external object a cell stands in for.
///
/// Used for identity comparison on removal and replace, never for layout
/// decisions.
pub type CellId = String;

/// Explicit column-span scale a producer may attach to a cell.
///
/// Spans are fractions of the column count; at the default 12 columns the
/// scale resolves to 1 / 3 / 6 / 9 / 12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeToken {
    Xs,
    S,
    M,
    L,
    Xl,
}

impl SizeToken {
    pub fn columns(self, column_count: u16) -> u16 {
        let cols = match self {
            SizeToken::Xs => 1,
            SizeToken::S => column_count / 4,
            SizeToken::M => column_count / 2,
            SizeToken::L => column_count / 4 * 3,
            SizeToken::Xl => column_count,
        };
        cols.clamp(1, column_count.max(1))
    }
}

/// Raw pixel measurement read once at intake time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub width: u32,
    pub height: u32,
}

impl Measurement {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Numbers the intake math needs from the pipeline configuration.
#[derive(Debug, Clone, Copy)]
pub struct IntakeSettings {
    pub column_count: u16,
    pub container_width: u32,
    pub row_unit_height: u32,
    pub row_gap: u32,
}

/// One packable unit and its placement state for the current pass.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: CellId,
    pub tags: Vec<String>,
    /// Computed once at intake, immutable for the rest of the pass.
    pub col_span: u16,
    pub row_span: u16,
    pub measured_height: u32,
    /// Written only by the packing engine, cleared at every rebuild start.
    pub position: Option<(u16, u16)>,
    pub placed: bool,
    /// Resolved rule target; `None` marks a flow cell.
    pub anchor: Option<AreaName>,
    /// Monotonic intake order, the documented placement tie-break.
    pub intake_seq: u64,
}

impl Cell {
    /// Computes spans from a raw measurement, preferring an explicit size
    /// token for the column axis. Non-positive measurements clamp to a
    /// one-track span rather than failing; a zero-span cell would be
    /// silently unplaceable.
    pub fn intake(
        id: CellId,
        measurement: Measurement,
        token: Option<SizeToken>,
        tags: Vec<String>,
        intake_seq: u64,
        settings: &IntakeSettings,
    ) -> Self {
        let column_count = settings.column_count.max(1);
        let col_span = match token {
            Some(token) => token.columns(column_count),
            None => ratio_col_span(measurement.width, settings.container_width, column_count),
        };
        let row_span = row_span_for(
            measurement.height,
            settings.row_unit_height,
            settings.row_gap,
        );

        Self {
            id,
            tags,
            col_span,
            row_span,
            measured_height: measurement.height,
            position: None,
            placed: false,
            anchor: None,
            intake_seq,
        }
    }

    /// Clears per-pass placement state. Spans survive; they are only
    /// recomputed by a fresh intake.
    pub fn reset(&mut self) {
        self.position = None;
        self.placed = false;
    }

    pub fn is_reservation(&self) -> bool {
        self.anchor.is_some()
    }

    /// Footprint the cell would occupy at the candidate coordinates.
    pub fn rect_at(&self, x: u16, y: u16) -> GridRect {
        GridRect::new(x, y, self.col_span, self.row_span)
    }
}

/// Ratio of measured width to container width, rounded up to whole columns.
fn ratio_col_span(width: u32, container_width: u32, column_count: u16) -> u16 {
    if width == 0 || container_width == 0 {
        return 1;
    }
    let scaled = (width as u64) * (column_count as u64);
    let span = scaled.div_ceil(container_width as u64);
    span.min(column_count as u64).max(1) as u16
}

/// `ceil(height / (row_unit_height + row_gap))`, clamped to at least one row.
fn row_span_for(height: u32, row_unit_height: u32, row_gap: u32) -> u16 {
    let unit = (row_unit_height + row_gap).max(1) as u64;
    let span = (height as u64).div_ceil(unit);
    span.clamp(1, u16::MAX as u64) as u16
}
