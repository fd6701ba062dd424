use crate::cell::CellId;
use crate::geometry::GridRect;

/// One placed rectangle, recorded the moment a cell is assigned a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyEntry {
    pub rect: GridRect,
    pub is_reservation: bool,
    pub cell: CellId,
}

impl OccupancyEntry {
    pub fn flow(rect: GridRect, cell: CellId) -> Self {
        Self {
            rect,
            is_reservation: false,
            cell,
        }
    }

    pub fn reservation(rect: GridRect, cell: CellId) -> Self {
        Self {
            rect,
            is_reservation: true,
            cell,
        }
    }
}

/// Set of all rectangles placed so far in the current pass.
///
/// Overlap queries are a linear scan. Cell counts are bounded by typical
/// sibling-element counts, so no acceleration structure is kept; the bound
/// is asserted in tests, not optimized for.
#[derive(Debug, Default)]
pub struct OccupancyRegister {
    entries: Vec<OccupancyEntry>,
}

impl OccupancyRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any registered rectangle intersects the candidate.
    pub fn overlaps(&self, candidate: &GridRect) -> bool {
        self.entries.iter().any(|e| e.rect.intersects(candidate))
    }

    pub fn register(&mut self, entry: OccupancyEntry) {
        self.entries.push(entry);
    }

    /// Removes and returns every reservation entry. Called when the grid
    /// grows and bottom-anchored reservations must be re-settled.
    pub fn unregister_reservations(&mut self) -> Vec<OccupancyEntry> {
        let (reservations, kept) = self
            .entries
            .drain(..)
            .partition(|entry| entry.is_reservation);
        self.entries = kept;
        reservations
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[OccupancyEntry] {
        &self.entries
    }

    /// Textual dump of the occupancy, one character per grid cell: `.` for
    /// free, `#` for flow entries, `R` for reservations. Debug aid for logs
    /// and tests.
    pub fn ascii_grid(&self, column_count: u16, row_count: u16) -> String {
        let mut out = String::with_capacity((column_count as usize + 1) * row_count as usize);
        for y in 0..row_count {
            for x in 0..column_count {
                let probe = GridRect::new(x, y, 1, 1);
                let glyph = self
                    .entries
                    .iter()
                    .find(|e| e.rect.intersects(&probe))
                    .map(|e| if e.is_reservation { 'R' } else { '#' })
                    .unwrap_or('.');
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(x: u16, y: u16, cols: u16, rows: u16) -> OccupancyEntry {
        OccupancyEntry::flow(GridRect::new(x, y, cols, rows), format!("cell-{x}-{y}"))
    }

    #[test]
    fn overlap_query_hits_any_registered_rect() {
        let mut register = OccupancyRegister::new();
        register.register(entry(0, 0, 6, 2));
        register.register(entry(6, 0, 6, 1));

        assert!(register.overlaps(&GridRect::new(5, 1, 2, 1)));
        assert!(!register.overlaps(&GridRect::new(6, 1, 6, 1)));
    }

    #[test]
    fn unregister_reservations_keeps_flow_entries() {
        let mut register = OccupancyRegister::new();
        register.register(entry(0, 0, 3, 1));
        register.register(OccupancyEntry::reservation(
            GridRect::new(9, 1, 3, 1),
            "pinned".to_string(),
        ));

        let removed = register.unregister_reservations();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].cell, "pinned");
        assert_eq!(register.len(), 1);
        assert!(!register.overlaps(&GridRect::new(9, 1, 3, 1)));
    }

    #[test]
    fn clear_empties_the_register() {
        let mut register = OccupancyRegister::new();
        register.register(entry(0, 0, 1, 1));
        register.clear();
        assert!(register.is_empty());
    }

    #[test]
    fn ascii_grid_marks_flow_and_reservations() {
        let mut register = OccupancyRegister::new();
        register.register(entry(0, 0, 2, 1));
        register.register(OccupancyEntry::reservation(
            GridRect::new(3, 1, 1, 1),
            "pinned".to_string(),
        ));

        let dump = register.ascii_grid(4, 2);
        assert_eq!(dump, "##..\n...R\n");
    }

    #[test]
    fn overlap_scan_is_linear_in_entry_count() {
        // Complexity bound, not an optimization target: the register keeps a
        // flat vector, so N entries mean N intersection tests per query.
        let mut register = OccupancyRegister::new();
        for y in 0..32 {
            register.register(entry(0, y, 1, 1));
        }
        assert_eq!(register.len(), 32);
        assert!(!register.overlaps(&GridRect::new(1, 0, 1, 1)));
    }
}
