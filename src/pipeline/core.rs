use std::collections::VecDeque;

use crate::area::{AreaMap, RuleSet, corner_areas};
use crate::cell::{Cell, CellId, IntakeSettings, Measurement, SizeToken};
use crate::engine::{PackingEngine, PassState};
use crate::error::{GridError, Result};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{MetricSnapshot, PackingMetrics};
use crate::occupancy::OccupancyRegister;
use crate::publish::{CellPlacement, GridDimensions, PlacementLedger, PlacementSink};

const LOG_TARGET: &str = "grid::pipeline";

/// Configuration accepted at initialization.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub column_count: u16,
    /// Container width in pixels, used for ratio-based column spans when a
    /// cell carries no explicit size token.
    pub container_width: u32,
    pub row_unit_height: u32,
    pub column_gap: u32,
    pub row_gap: u32,
    pub rules: RuleSet,
    pub areas: AreaMap,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            column_count: 12,
            container_width: 1200,
            row_unit_height: 20,
            column_gap: 0,
            row_gap: 0,
            rules: RuleSet::default(),
            areas: corner_areas(),
        }
    }
}

impl GridConfig {
    fn intake_settings(&self) -> IntakeSettings {
        IntakeSettings {
            column_count: self.column_count,
            container_width: self.container_width,
            row_unit_height: self.row_unit_height,
            row_gap: self.row_gap,
        }
    }
}

/// One cell-set change reported by the external change-detection
/// collaborator. A resize is a replace: the old entry is dropped from
/// whichever store holds it and the cell is re-measured from scratch.
#[derive(Debug, Clone)]
pub enum CellDelta {
    Added {
        id: CellId,
        measurement: Measurement,
        size_token: Option<SizeToken>,
        tags: Vec<String>,
    },
    Resized {
        id: CellId,
        measurement: Measurement,
        size_token: Option<SizeToken>,
        tags: Vec<String>,
    },
    Removed {
        id: CellId,
    },
}

/// Owner of all mutable packing state: cell stores, occupancy register,
/// engine, and the ledger of published placements. Single-threaded,
/// run-to-completion per pass; deltas arriving while a pass runs are queued
/// and drained by the next pass, never interleaved.
pub struct GridPipeline {
    config: GridConfig,
    engine: PackingEngine,
    register: OccupancyRegister,
    reservations: Vec<Cell>,
    flow: Vec<Cell>,
    ledger: PlacementLedger,
    pending: VecDeque<CellDelta>,
    rebuild_in_progress: bool,
    intake_seq: u64,
    logger: Option<Logger>,
    metrics: PackingMetrics,
}

impl GridPipeline {
    pub fn new(config: GridConfig) -> Self {
        let engine = PackingEngine::new(config.column_count);
        Self {
            config,
            engine,
            register: OccupancyRegister::new(),
            reservations: Vec::new(),
            flow: Vec::new(),
            ledger: PlacementLedger::new(),
            pending: VecDeque::new(),
            rebuild_in_progress: false,
            intake_seq: 0,
            logger: None,
            metrics: PackingMetrics::new(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Queues a delta for the next pass. Always safe to call; deltas are
    /// only drained at a pass boundary.
    pub fn ingest(&mut self, delta: CellDelta) {
        self.pending.push_back(delta);
    }

    pub fn pending_deltas(&self) -> usize {
        self.pending.len()
    }

    pub fn rebuild_in_progress(&self) -> bool {
        self.rebuild_in_progress
    }

    pub fn cell_count(&self) -> usize {
        self.reservations.len() + self.flow.len()
    }

    pub fn column_count(&self) -> u16 {
        self.engine.column_count()
    }

    /// Row count of the last settled pass.
    pub fn row_count(&self) -> u16 {
        self.engine.row_count()
    }

    pub fn pass_state(&self) -> PassState {
        self.engine.state()
    }

    pub fn ledger(&self) -> &PlacementLedger {
        &self.ledger
    }

    /// Drains the cells whose published placement changed in the last pass.
    pub fn take_dirty(&mut self) -> Vec<CellPlacement> {
        self.ledger.take_dirty()
    }

    pub fn metrics(&self) -> MetricSnapshot {
        self.metrics.snapshot()
    }

    /// Textual dump of the current occupancy, for logs and debugging.
    pub fn occupancy_snapshot(&self) -> String {
        self.register
            .ascii_grid(self.engine.column_count(), self.engine.row_count())
    }

    /// Runs one full recompute cycle over the queued deltas and publishes
    /// the settled layout to the sink.
    ///
    /// A reentrant call while a pass is active is rejected; the queued
    /// deltas stay put and are coalesced into the caller's next attempt. On
    /// a fatal placement error the ledger keeps the previously published
    /// layout.
    pub fn rebuild(&mut self, sink: &mut dyn PlacementSink) -> Result<()> {
        if self.rebuild_in_progress {
            return Err(GridError::RebuildInProgress);
        }
        self.rebuild_in_progress = true;
        let outcome = self.run_pass(sink);
        // Re-arm ingestion only once publishing is done, so a sink that
        // feeds observations back into the producer cannot loop the pass.
        self.rebuild_in_progress = false;
        outcome
    }

    fn run_pass(&mut self, sink: &mut dyn PlacementSink) -> Result<()> {
        self.engine.begin_pass();

        for cell in self.reservations.iter_mut().chain(self.flow.iter_mut()) {
            cell.reset();
        }

        let batch: Vec<CellDelta> = self.pending.drain(..).collect();
        let (added, removed) = self.apply_deltas(batch);

        self.register.clear();
        let estimate = self.row_estimate();

        self.log(event_with_fields(
            LogLevel::Debug,
            LOG_TARGET,
            "pass_started",
            [
                json_kv("added", added),
                json_kv("removed", removed),
                json_kv("cells", self.cell_count()),
                json_kv("row_estimate", estimate),
            ],
        ));

        let placed = self.engine.place_all(
            estimate,
            &mut self.reservations,
            &mut self.flow,
            &self.config.areas,
            &mut self.register,
        );

        if let Err(err) = placed {
            self.metrics.record_failed_pass();
            self.log(event_with_fields(
                LogLevel::Error,
                LOG_TARGET,
                "pass_failed",
                [json_kv("error", err.to_string())],
            ));
            return Err(err);
        }

        self.publish(sink)?;

        self.metrics.record_pass(
            self.cell_count(),
            self.engine.growth_steps(),
            self.engine.resettled(),
        );
        self.log(event_with_fields(
            LogLevel::Info,
            LOG_TARGET,
            "pass_settled",
            [
                json_kv("row_count", self.engine.row_count()),
                json_kv("column_count", self.engine.column_count()),
                json_kv("growth_steps", self.engine.growth_steps()),
                json_kv("cells", self.cell_count()),
            ],
        ));
        Ok(())
    }

    /// Applies a delta batch to the cell stores. Returns (added, removed)
    /// counts for logging.
    fn apply_deltas(&mut self, batch: Vec<CellDelta>) -> (usize, usize) {
        let mut added = 0;
        let mut removed = 0;

        for delta in batch {
            match delta {
                CellDelta::Removed { id } => {
                    if self.remove_cell(&id).is_some() {
                        removed += 1;
                    } else {
                        // Unknown reference: a no-op, not an error.
                        self.log(event_with_fields(
                            LogLevel::Debug,
                            LOG_TARGET,
                            "removal_ignored",
                            [json_kv("cell", id.clone())],
                        ));
                    }
                }
                CellDelta::Added {
                    id,
                    measurement,
                    size_token,
                    tags,
                }
                | CellDelta::Resized {
                    id,
                    measurement,
                    size_token,
                    tags,
                } => {
                    if self.remove_cell(&id).is_some() {
                        // Duplicate reference or resize: last intake wins.
                        self.log(event_with_fields(
                            LogLevel::Debug,
                            LOG_TARGET,
                            "cell_replaced",
                            [json_kv("cell", id.clone())],
                        ));
                    }
                    self.intake(id, measurement, size_token, tags);
                    added += 1;
                }
            }
        }

        (added, removed)
    }

    fn intake(
        &mut self,
        id: CellId,
        measurement: Measurement,
        size_token: Option<SizeToken>,
        tags: Vec<String>,
    ) {
        let seq = self.intake_seq;
        self.intake_seq += 1;

        let mut cell = Cell::intake(
            id,
            measurement,
            size_token,
            tags,
            seq,
            &self.config.intake_settings(),
        );

        match self.config.rules.classify(&cell.tags) {
            Some(area_name) if self.config.areas.contains_key(area_name) => {
                cell.anchor = Some(area_name.clone());
                self.reservations.push(cell);
            }
            Some(area_name) => {
                // UnresolvedArea policy: demote to flow, report, keep going.
                let err = GridError::UnresolvedArea {
                    cell: cell.id.clone(),
                    area: area_name.clone(),
                };
                self.log(event_with_fields(
                    LogLevel::Warn,
                    LOG_TARGET,
                    "area_unresolved",
                    [
                        json_kv("cell", cell.id.clone()),
                        json_kv("error", err.to_string()),
                    ],
                ));
                self.flow.push(cell);
            }
            None => self.flow.push(cell),
        }
    }

    fn remove_cell(&mut self, id: &CellId) -> Option<Cell> {
        if let Some(pos) = self.reservations.iter().position(|c| &c.id == id) {
            return Some(self.reservations.remove(pos));
        }
        if let Some(pos) = self.flow.iter().position(|c| &c.id == id) {
            return Some(self.flow.remove(pos));
        }
        None
    }

    /// Initial row count from the tallest surviving cell, so the first
    /// resolution of bottom anchors lands near its final spot.
    fn row_estimate(&self) -> u16 {
        self.reservations
            .iter()
            .chain(self.flow.iter())
            .map(|c| c.row_span)
            .max()
            .unwrap_or(1)
    }

    fn publish(&mut self, sink: &mut dyn PlacementSink) -> Result<()> {
        let mut cells: Vec<&Cell> = self.reservations.iter().chain(self.flow.iter()).collect();
        cells.sort_by_key(|c| c.intake_seq);

        let mut placements = Vec::with_capacity(cells.len());
        for cell in cells {
            if let Some((x, y)) = cell.position {
                placements.push(CellPlacement {
                    cell: cell.id.clone(),
                    column_start: x + 1,
                    column_span: cell.col_span,
                    row_start: y + 1,
                    row_span: cell.row_span,
                });
            }
        }

        let dimensions = GridDimensions {
            column_count: self.engine.column_count(),
            row_count: self.engine.row_count(),
            column_gap: self.config.column_gap,
            row_gap: self.config.row_gap,
            row_unit_height: self.config.row_unit_height,
        };

        for placement in &placements {
            sink.publish_cell(placement)?;
        }
        sink.publish_dimensions(&dimensions)?;

        self.ledger.sync(&placements, dimensions);
        Ok(())
    }

    /// Logging failures never abort a pass.
    fn log(&self, event: crate::logging::LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log_event(event);
        }
    }
}
