use serde_json::json;

use crate::logging::{LogEvent, LogFields, LogLevel};

/// Counters accumulated across rebuild passes.
#[derive(Debug, Default, Clone)]
pub struct PackingMetrics {
    passes: u64,
    failed_passes: u64,
    cells_placed: u64,
    growth_steps: u64,
    reservations_resettled: u64,
}

impl PackingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&mut self, placed: usize, growth_steps: usize, resettled: usize) {
        self.passes = self.passes.saturating_add(1);
        self.cells_placed = self.cells_placed.saturating_add(placed as u64);
        self.growth_steps = self.growth_steps.saturating_add(growth_steps as u64);
        self.reservations_resettled = self
            .reservations_resettled
            .saturating_add(resettled as u64);
    }

    pub fn record_failed_pass(&mut self) {
        self.failed_passes = self.failed_passes.saturating_add(1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            passes: self.passes,
            failed_passes: self.failed_passes,
            cells_placed: self.cells_placed,
            growth_steps: self.growth_steps,
            reservations_resettled: self.reservations_resettled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub passes: u64,
    pub failed_passes: u64,
    pub cells_placed: u64,
    pub growth_steps: u64,
    pub reservations_resettled: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("passes".to_string(), json!(self.passes));
        map.insert("failed_passes".to_string(), json!(self.failed_passes));
        map.insert("cells_placed".to_string(), json!(self.cells_placed));
        map.insert("growth_steps".to_string(), json!(self.growth_steps));
        map.insert(
            "reservations_resettled".to_string(),
            json!(self.reservations_resettled),
        );
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "packing_metrics", self.as_fields())
    }
}
