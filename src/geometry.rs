//! Grid-coordinate geometry primitives.
//!
//! Coordinates are zero-based column/row indices, not pixels. Spans are
//! measured in whole tracks; a rectangle covers the half-open ranges
//! `x..x + cols` and `y..y + rows`.

/// Axis-aligned rectangle in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub x: u16,
    pub y: u16,
    pub cols: u16,
    pub rows: u16,
}

impl GridRect {
    pub const fn new(x: u16, y: u16, cols: u16, rows: u16) -> Self {
        Self { x, y, cols, rows }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u16 {
        self.x + self.cols
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u16 {
        self.y + self.rows
    }

    /// Standard axis-aligned intersection test over half-open ranges.
    pub fn intersects(&self, other: &GridRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True when the rectangle lies entirely inside a grid of the given size.
    pub fn within(&self, column_count: u16, row_count: u16) -> bool {
        self.right() <= column_count && self.bottom() <= row_count
    }
}
