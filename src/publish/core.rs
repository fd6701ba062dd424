use std::collections::{HashMap, HashSet};

use blake3::Hash;
use serde::Serialize;

use crate::cell::CellId;
use crate::error::Result;

/// Final placement of one cell, in the 1-based coordinates stylesheet
/// generators speak (`grid-column-start` and friends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPlacement {
    pub cell: CellId,
    pub column_start: u16,
    pub column_span: u16,
    pub row_start: u16,
    pub row_span: u16,
}

impl CellPlacement {
    fn content_hash(&self) -> Hash {
        let mut bytes = [0u8; 8];
        bytes[0..2].copy_from_slice(&self.column_start.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.column_span.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.row_start.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.row_span.to_le_bytes());
        blake3::hash(&bytes)
    }
}

/// Published grid size plus the configuration a stylesheet generator needs
/// to turn track coordinates back into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridDimensions {
    pub column_count: u16,
    pub row_count: u16,
    pub column_gap: u32,
    pub row_gap: u32,
    pub row_unit_height: u32,
}

/// Receives the published layout once per settled pass.
pub trait PlacementSink {
    fn publish_cell(&mut self, placement: &CellPlacement) -> Result<()>;
    fn publish_dimensions(&mut self, dimensions: &GridDimensions) -> Result<()>;
}

/// Sink that keeps the last published layout in memory. Used in tests and
/// benches, and handy for consumers that poll instead of subscribing.
#[derive(Debug, Default)]
pub struct LayoutCapture {
    pub placements: Vec<CellPlacement>,
    pub dimensions: Option<GridDimensions>,
}

impl LayoutCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placement_of(&self, cell: &str) -> Option<&CellPlacement> {
        self.placements.iter().find(|p| p.cell == cell)
    }
}

impl PlacementSink for LayoutCapture {
    fn publish_cell(&mut self, placement: &CellPlacement) -> Result<()> {
        self.placements.retain(|p| p.cell != placement.cell);
        self.placements.push(placement.clone());
        Ok(())
    }

    fn publish_dimensions(&mut self, dimensions: &GridDimensions) -> Result<()> {
        self.dimensions = Some(*dimensions);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    placement: CellPlacement,
    hash: Hash,
}

/// Last published placement per cell, hashed so unchanged cells can be
/// skipped by incremental consumers. Only updated after a settled pass; a
/// failed pass leaves the previous layout authoritative.
#[derive(Debug, Default)]
pub struct PlacementLedger {
    entries: HashMap<CellId, LedgerEntry>,
    dirty: HashSet<CellId>,
    dimensions: Option<GridDimensions>,
}

impl PlacementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ledger content with the placements of a settled pass,
    /// marking cells whose coordinates changed (or that are new) as dirty
    /// and dropping cells no longer present.
    pub fn sync(&mut self, placements: &[CellPlacement], dimensions: GridDimensions) {
        use std::collections::hash_map::Entry;

        for placement in placements {
            let hash = placement.content_hash();
            match self.entries.entry(placement.cell.clone()) {
                Entry::Occupied(mut occupied) => {
                    if occupied.get().hash != hash {
                        occupied.insert(LedgerEntry {
                            placement: placement.clone(),
                            hash,
                        });
                        self.dirty.insert(placement.cell.clone());
                    }
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(LedgerEntry {
                        placement: placement.clone(),
                        hash,
                    });
                    self.dirty.insert(placement.cell.clone());
                }
            }
        }

        let removed: Vec<CellId> = self
            .entries
            .keys()
            .filter(|id| !placements.iter().any(|p| &p.cell == *id))
            .cloned()
            .collect();
        for id in removed {
            self.entries.remove(&id);
            self.dirty.remove(&id);
        }

        self.dimensions = Some(dimensions);
    }

    pub fn placement_of(&self, cell: &str) -> Option<&CellPlacement> {
        self.entries.get(cell).map(|entry| &entry.placement)
    }

    pub fn dimensions(&self) -> Option<GridDimensions> {
        self.dimensions
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drains the set of cells whose placement changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<CellPlacement> {
        let ids: Vec<CellId> = self.dirty.drain().collect();
        let mut changed: Vec<CellPlacement> = ids
            .into_iter()
            .filter_map(|id| self.entries.get(&id).map(|e| e.placement.clone()))
            .collect();
        changed.sort_by(|a, b| a.cell.cmp(&b.cell));
        changed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(cell: &str, column_start: u16, row_start: u16) -> CellPlacement {
        CellPlacement {
            cell: cell.to_string(),
            column_start,
            column_span: 3,
            row_start,
            row_span: 1,
        }
    }

    fn dims(row_count: u16) -> GridDimensions {
        GridDimensions {
            column_count: 12,
            row_count,
            column_gap: 0,
            row_gap: 0,
            row_unit_height: 20,
        }
    }

    #[test]
    fn new_placements_are_dirty() {
        let mut ledger = PlacementLedger::new();
        ledger.sync(&[placement("a", 1, 1)], dims(2));
        let dirty = ledger.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].cell, "a");
        assert!(!ledger.has_dirty());
    }

    #[test]
    fn unchanged_placements_stay_clean() {
        let mut ledger = PlacementLedger::new();
        ledger.sync(&[placement("a", 1, 1)], dims(2));
        ledger.take_dirty();

        ledger.sync(&[placement("a", 1, 1)], dims(2));
        assert!(ledger.take_dirty().is_empty());

        ledger.sync(&[placement("a", 4, 1)], dims(2));
        let dirty = ledger.take_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].column_start, 4);
    }

    #[test]
    fn removed_cells_leave_the_ledger() {
        let mut ledger = PlacementLedger::new();
        ledger.sync(&[placement("a", 1, 1), placement("b", 4, 1)], dims(2));
        ledger.take_dirty();

        ledger.sync(&[placement("a", 1, 1)], dims(2));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.placement_of("b").is_none());
        assert!(ledger.take_dirty().is_empty());
    }

    #[test]
    fn capture_replaces_per_cell() {
        let mut capture = LayoutCapture::new();
        capture.publish_cell(&placement("a", 1, 1)).unwrap();
        capture.publish_cell(&placement("a", 4, 2)).unwrap();
        capture.publish_dimensions(&dims(3)).unwrap();

        assert_eq!(capture.placements.len(), 1);
        assert_eq!(capture.placement_of("a").unwrap().row_start, 2);
        assert_eq!(capture.dimensions.unwrap().row_count, 3);
    }
}
