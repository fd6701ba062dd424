use crate::area::AreaMap;
use crate::cell::Cell;
use crate::error::{GridError, Result};
use crate::geometry::GridRect;
use crate::occupancy::{OccupancyEntry, OccupancyRegister};

/// Lifecycle of one rebuild pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Measuring,
    Placing,
    Settled,
}

/// Greedy placement engine for one pass over the cell set.
///
/// The engine owns the grid's dynamic row count for the duration of a pass.
/// The column count is fixed; the row count starts at the pipeline's
/// estimate and only grows, never shrinks, until the next pass resets it.
#[derive(Debug)]
pub struct PackingEngine {
    column_count: u16,
    row_count: u16,
    state: PassState,
    growth_steps: usize,
    resettled: usize,
}

impl PackingEngine {
    pub fn new(column_count: u16) -> Self {
        Self {
            column_count: column_count.max(1),
            row_count: 1,
            state: PassState::Idle,
            growth_steps: 0,
            resettled: 0,
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn column_count(&self) -> u16 {
        self.column_count
    }

    pub fn row_count(&self) -> u16 {
        self.row_count
    }

    /// Growth iterations taken by the last pass.
    pub fn growth_steps(&self) -> usize {
        self.growth_steps
    }

    /// Reservation re-placements performed by the last pass.
    pub fn resettled(&self) -> usize {
        self.resettled
    }

    /// Opens a pass: resets the row count to one and moves to `Measuring`
    /// while the pipeline runs intake over the delta batch.
    pub fn begin_pass(&mut self) {
        self.row_count = 1;
        self.growth_steps = 0;
        self.resettled = 0;
        self.state = PassState::Measuring;
    }

    /// Places every cell for this pass. Reservations settle first so flow
    /// cells pack around them; flow cells go tallest-first through a
    /// row-major first-fit search, growing the grid when blocked.
    ///
    /// `row_estimate` seeds the row count (the pipeline derives it from the
    /// tallest surviving cell) so the first resolution of bottom anchors is
    /// reasonable; growth may still revise it upward.
    ///
    /// Growth is monotonic and capped at the total cell count, so the pass
    /// always terminates; exceeding the cap is `PlacementExhausted`.
    pub fn place_all(
        &mut self,
        row_estimate: u16,
        reservations: &mut [Cell],
        flow: &mut [Cell],
        areas: &AreaMap,
        register: &mut OccupancyRegister,
    ) -> Result<()> {
        self.row_count = self.row_count.max(row_estimate.max(1));
        self.state = PassState::Placing;
        let growth_cap = (reservations.len() + flow.len()).max(1);

        self.settle_reservations(reservations, areas, register, growth_cap)?;

        // Tallest first, ties by intake order. Tall cells are hardest to
        // slot into partially filled rows, so they go in while the grid is
        // emptiest.
        let mut order: Vec<usize> = (0..flow.len()).collect();
        order.sort_by(|&a, &b| {
            flow[b]
                .row_span
                .cmp(&flow[a].row_span)
                .then(flow[a].intake_seq.cmp(&flow[b].intake_seq))
        });

        for idx in order {
            loop {
                let cell = &flow[idx];
                if let Some((x, y)) = self.first_fit(cell.col_span, cell.row_span, (0, 0), register)
                {
                    let cell = &mut flow[idx];
                    cell.position = Some((x, y));
                    cell.placed = true;
                    register.register(OccupancyEntry::flow(cell.rect_at(x, y), cell.id.clone()));
                    break;
                }
                // Blocked: grow by exactly this cell's row span, then move
                // bottom-anchored reservations down before retrying.
                self.grow(flow[idx].row_span, &flow[idx].id, growth_cap)?;
                self.settle_reservations(reservations, areas, register, growth_cap)?;
            }
        }

        self.state = PassState::Settled;

        for cell in reservations.iter().chain(flow.iter()) {
            if !cell.placed {
                return Err(GridError::PlacementIncomplete {
                    cell: cell.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Unregisters every reservation, re-resolves each anchor against the
    /// current row count and re-places them in intake order. Grows and
    /// starts over if a reservation no longer fits.
    fn settle_reservations(
        &mut self,
        reservations: &mut [Cell],
        areas: &AreaMap,
        register: &mut OccupancyRegister,
        growth_cap: usize,
    ) -> Result<()> {
        loop {
            register.unregister_reservations();
            for cell in reservations.iter_mut() {
                cell.reset();
            }

            match self.place_reservations_once(reservations, areas, register) {
                None => return Ok(()),
                Some(blocked) => {
                    let row_span = reservations[blocked].row_span;
                    let id = reservations[blocked].id.clone();
                    self.grow(row_span, &id, growth_cap)?;
                }
            }
        }
    }

    /// One settlement attempt. Returns the index of the first reservation
    /// that found no position, if any.
    fn place_reservations_once(
        &mut self,
        reservations: &mut [Cell],
        areas: &AreaMap,
        register: &mut OccupancyRegister,
    ) -> Option<usize> {
        for (idx, cell) in reservations.iter_mut().enumerate() {
            // The pipeline demotes cells with unknown areas to flow before
            // the pass starts, so the lookup only misses if the anchor was
            // resolved against a name the map never held; seed at the
            // origin in that case and let the search place it.
            let seed = cell
                .anchor
                .as_ref()
                .and_then(|name| areas.get(name))
                .map(|area| {
                    area.resolve(
                        cell.col_span,
                        cell.row_span,
                        self.row_count,
                        self.column_count,
                    )
                })
                .unwrap_or((0, 0));

            match self.first_fit(cell.col_span, cell.row_span, seed, register) {
                Some((x, y)) => {
                    cell.position = Some((x, y));
                    cell.placed = true;
                    register.register(OccupancyEntry::reservation(
                        cell.rect_at(x, y),
                        cell.id.clone(),
                    ));
                    self.resettled += 1;
                }
                None => return Some(idx),
            }
        }
        None
    }

    /// Row-major free-position search: rows outer, columns inner, first
    /// non-overlapping in-bounds rectangle wins. Flow cells seed at the
    /// origin; reservations seed at their resolved anchor and search
    /// forward from there.
    fn first_fit(
        &self,
        col_span: u16,
        row_span: u16,
        seed: (u16, u16),
        register: &OccupancyRegister,
    ) -> Option<(u16, u16)> {
        if col_span > self.column_count {
            return None;
        }
        let max_x = self.column_count - col_span;
        let (seed_x, seed_y) = seed;

        let mut y = seed_y;
        while y + row_span <= self.row_count {
            let start_x = if y == seed_y { seed_x.min(max_x) } else { 0 };
            for x in start_x..=max_x {
                let rect = GridRect::new(x, y, col_span, row_span);
                if !register.overlaps(&rect) {
                    return Some((x, y));
                }
            }
            y += 1;
        }
        None
    }

    fn grow(&mut self, row_span: u16, cell: &str, growth_cap: usize) -> Result<()> {
        self.growth_steps += 1;
        if self.growth_steps > growth_cap {
            return Err(GridError::PlacementExhausted {
                cell: cell.to_string(),
                growth_steps: self.growth_steps,
            });
        }
        self.row_count = self.row_count.saturating_add(row_span.max(1));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{Area, AreaMap, ColumnAnchor, RowAnchor};
    use crate::cell::{Cell, CellId};

    fn flow_cell(id: &str, col_span: u16, row_span: u16, seq: u64) -> Cell {
        Cell {
            id: CellId::from(id),
            tags: Vec::new(),
            col_span,
            row_span,
            measured_height: 0,
            position: None,
            placed: false,
            anchor: None,
            intake_seq: seq,
        }
    }

    fn reserved_cell(id: &str, col_span: u16, row_span: u16, area: &str, seq: u64) -> Cell {
        let mut cell = flow_cell(id, col_span, row_span, seq);
        cell.anchor = Some(area.to_string());
        cell
    }

    fn bottom_right_areas() -> AreaMap {
        let mut areas = AreaMap::new();
        areas.insert(
            "right-bottom".to_string(),
            Area::new(ColumnAnchor::Rightmost, RowAnchor::Bottom),
        );
        areas
    }

    fn assert_no_overlaps(cells: &[&Cell]) {
        for (i, a) in cells.iter().enumerate() {
            for b in &cells[i + 1..] {
                let (ax, ay) = a.position.unwrap();
                let (bx, by) = b.position.unwrap();
                assert!(
                    !a.rect_at(ax, ay).intersects(&b.rect_at(bx, by)),
                    "cells `{}` and `{}` overlap",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn full_width_cells_stack_row_major() {
        let mut engine = PackingEngine::new(12);
        let mut flow = vec![
            flow_cell("a", 12, 3, 0),
            flow_cell("b", 12, 1, 1),
            flow_cell("c", 12, 1, 2),
        ];
        let mut register = OccupancyRegister::new();

        engine.begin_pass();
        engine
            .place_all(3, &mut [], &mut flow, &AreaMap::new(), &mut register)
            .unwrap();

        assert_eq!(flow[0].position, Some((0, 0)));
        assert_eq!(flow[1].position, Some((0, 3)));
        assert_eq!(flow[2].position, Some((0, 4)));
        assert_eq!(engine.row_count(), 5);
        assert_eq!(engine.state(), PassState::Settled);
    }

    #[test]
    fn tallest_cell_goes_first_with_intake_order_tie_break() {
        let mut engine = PackingEngine::new(12);
        let mut flow = vec![
            flow_cell("short", 6, 1, 0),
            flow_cell("tall-late", 6, 2, 2),
            flow_cell("tall-early", 6, 2, 1),
        ];
        let mut register = OccupancyRegister::new();

        engine.begin_pass();
        engine
            .place_all(2, &mut [], &mut flow, &AreaMap::new(), &mut register)
            .unwrap();

        // Both tall cells fit side by side in the first two rows; the
        // earlier intake takes the leftmost slot.
        assert_eq!(flow[2].position, Some((0, 0)));
        assert_eq!(flow[1].position, Some((6, 0)));
        assert_eq!(flow[0].position, Some((0, 2)));
        assert_eq!(engine.row_count(), 3);
    }

    #[test]
    fn first_fit_takes_first_free_slot_not_best() {
        let mut engine = PackingEngine::new(12);
        let mut flow = vec![
            flow_cell("wide", 9, 1, 0),
            flow_cell("narrow", 2, 1, 1),
            flow_cell("tiny", 1, 1, 2),
        ];
        let mut register = OccupancyRegister::new();

        engine.begin_pass();
        engine
            .place_all(1, &mut [], &mut flow, &AreaMap::new(), &mut register)
            .unwrap();

        // Row 0 still has a 3-column gap after the wide cell; both small
        // cells slot into it left to right.
        assert_eq!(flow[0].position, Some((0, 0)));
        assert_eq!(flow[1].position, Some((9, 0)));
        assert_eq!(flow[2].position, Some((11, 0)));
        assert_eq!(engine.row_count(), 1);
        assert_eq!(engine.growth_steps(), 0);
    }

    #[test]
    fn growth_moves_bottom_reservation_down() {
        let mut engine = PackingEngine::new(12);
        let mut reservations = vec![reserved_cell("pinned", 3, 1, "right-bottom", 0)];
        let mut flow = vec![flow_cell("hero", 12, 2, 1)];
        let mut register = OccupancyRegister::new();
        let areas = bottom_right_areas();

        engine.begin_pass();
        engine
            .place_all(2, &mut reservations, &mut flow, &areas, &mut register)
            .unwrap();

        // The reservation first settles at (9, 1); the full-width flow cell
        // cannot coexist with it in two rows, so the grid grows by the flow
        // cell's span and the reservation tracks the new bottom.
        assert_eq!(flow[0].position, Some((0, 0)));
        assert_eq!(engine.row_count(), 4);
        assert_eq!(reservations[0].position, Some((9, 3)));
        assert_eq!(engine.growth_steps(), 1);
        assert_no_overlaps(&[&reservations[0], &flow[0]]);
    }

    #[test]
    fn reservation_anchor_reflects_final_row_count() {
        let mut engine = PackingEngine::new(12);
        let mut reservations = vec![reserved_cell("pinned", 2, 1, "right-bottom", 0)];
        let mut flow = vec![
            flow_cell("a", 12, 3, 1),
            flow_cell("b", 12, 1, 2),
            flow_cell("c", 12, 1, 3),
        ];
        let mut register = OccupancyRegister::new();
        let areas = bottom_right_areas();

        engine.begin_pass();
        engine
            .place_all(3, &mut reservations, &mut flow, &areas, &mut register)
            .unwrap();

        let (_, y) = reservations[0].position.unwrap();
        assert_eq!(y, engine.row_count() - reservations[0].row_span);
    }

    #[test]
    fn reservation_searches_forward_from_its_anchor() {
        let mut engine = PackingEngine::new(12);
        let mut reservations = vec![
            reserved_cell("first", 4, 1, "middle", 0),
            reserved_cell("second", 4, 1, "middle", 1),
        ];
        let mut areas = AreaMap::new();
        areas.insert(
            "middle".to_string(),
            Area::new(ColumnAnchor::Column(4), RowAnchor::Row(0)),
        );
        let mut register = OccupancyRegister::new();

        engine.begin_pass();
        engine
            .place_all(1, &mut reservations, &mut [], &areas, &mut register)
            .unwrap();

        // Both resolve to (4, 0). The second searches forward from the
        // anchor, not from the grid origin, so it lands to the right of the
        // first instead of claiming the free space at column 0.
        assert_eq!(reservations[0].position, Some((4, 0)));
        assert_eq!(reservations[1].position, Some((8, 0)));
        assert_eq!(engine.growth_steps(), 0);
    }

    #[test]
    fn growth_iterations_bounded_by_cell_count() {
        let mut engine = PackingEngine::new(12);
        let mut flow: Vec<Cell> = (0..6)
            .map(|i| flow_cell(&format!("cell-{i}"), 12, 2, i))
            .collect();
        let mut register = OccupancyRegister::new();

        engine.begin_pass();
        engine
            .place_all(2, &mut [], &mut flow, &AreaMap::new(), &mut register)
            .unwrap();

        assert!(engine.growth_steps() <= flow.len());
        assert!(flow.iter().all(|c| c.placed));
    }

    #[test]
    fn no_overlaps_in_a_mixed_settled_pass() {
        let mut engine = PackingEngine::new(12);
        let mut reservations = vec![reserved_cell("pinned", 4, 2, "right-bottom", 0)];
        let mut flow = vec![
            flow_cell("a", 6, 2, 1),
            flow_cell("b", 6, 3, 2),
            flow_cell("c", 3, 1, 3),
            flow_cell("d", 12, 1, 4),
            flow_cell("e", 4, 2, 5),
        ];
        let mut register = OccupancyRegister::new();
        let areas = bottom_right_areas();

        engine.begin_pass();
        engine
            .place_all(3, &mut reservations, &mut flow, &areas, &mut register)
            .unwrap();

        let all: Vec<&Cell> = reservations.iter().chain(flow.iter()).collect();
        assert_no_overlaps(&all);
        for cell in &all {
            let (x, y) = cell.position.unwrap();
            assert!(cell.rect_at(x, y).within(12, engine.row_count()));
        }
    }

    #[test]
    fn duplicate_bottom_anchors_exhaust_placement() {
        let mut engine = PackingEngine::new(12);
        // Two reservations pinned to the same bottom corner chase each other
        // downward forever: every growth step moves both anchors to the new
        // bottom row. The growth cap must stop the pass instead of looping.
        let mut reservations = vec![
            reserved_cell("one", 3, 1, "right-bottom", 0),
            reserved_cell("two", 3, 1, "right-bottom", 1),
        ];
        let mut register = OccupancyRegister::new();
        let areas = bottom_right_areas();

        engine.begin_pass();
        let err = engine
            .place_all(1, &mut reservations, &mut [], &areas, &mut register)
            .unwrap_err();
        assert!(matches!(err, GridError::PlacementExhausted { .. }));
    }
}
