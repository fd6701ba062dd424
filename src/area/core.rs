use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Unique key of an anchor area, e.g. `"right-bottom"`.
pub type AreaName = String;

/// Map from area name to anchor definition, accepted at initialization.
pub type AreaMap = HashMap<AreaName, Area>;

/// Column anchor of an area: a fixed column index or the rightmost column
/// that still fits the cell's column span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAnchor {
    Column(u16),
    Rightmost,
}

/// Row anchor of an area: a fixed row index or the bottom row given the
/// grid's current total row count and the cell's row span.
///
/// `Bottom` depends on the row count, so any placement that changes the row
/// count must re-resolve bottom-anchored areas. The packing engine drives
/// that re-resolution; the resolver itself holds no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAnchor {
    Row(u16),
    Bottom,
}

/// A named anchor point in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub column: ColumnAnchor,
    pub row: RowAnchor,
}

impl Area {
    pub const fn new(column: ColumnAnchor, row: RowAnchor) -> Self {
        Self { column, row }
    }

    /// Substitutes sentinels against the current grid size and clamps fixed
    /// coordinates so the resulting footprint stays inside the grid.
    pub fn resolve(
        &self,
        col_span: u16,
        row_span: u16,
        row_count: u16,
        column_count: u16,
    ) -> (u16, u16) {
        let max_x = column_count.saturating_sub(col_span);
        let max_y = row_count.saturating_sub(row_span);
        let x = match self.column {
            ColumnAnchor::Column(col) => col.min(max_x),
            ColumnAnchor::Rightmost => max_x,
        };
        let y = match self.row {
            RowAnchor::Row(row) => row.min(max_y),
            RowAnchor::Bottom => max_y,
        };
        (x, y)
    }
}

/// The four corner areas the original grid ships with.
pub fn corner_areas() -> AreaMap {
    let mut areas = AreaMap::new();
    areas.insert(
        "left-top".to_string(),
        Area::new(ColumnAnchor::Column(0), RowAnchor::Row(0)),
    );
    areas.insert(
        "left-bottom".to_string(),
        Area::new(ColumnAnchor::Column(0), RowAnchor::Bottom),
    );
    areas.insert(
        "right-top".to_string(),
        Area::new(ColumnAnchor::Rightmost, RowAnchor::Row(0)),
    );
    areas.insert(
        "right-bottom".to_string(),
        Area::new(ColumnAnchor::Rightmost, RowAnchor::Bottom),
    );
    areas
}

/// Matching capability of a rule. A closed enumeration keeps rules data, not
/// code, so classification stays pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RulePredicate {
    /// Matches cells carrying the given external tag.
    HasTag(String),
}

impl RulePredicate {
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            RulePredicate::HasTag(tag) => tags.iter().any(|t| t == tag),
        }
    }
}

/// One routing rule: cells matching the predicate anchor at the named area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub predicate: RulePredicate,
    pub area: AreaName,
}

impl Rule {
    pub fn tag(tag: impl Into<String>, area: impl Into<AreaName>) -> Self {
        Self {
            predicate: RulePredicate::HasTag(tag.into()),
            area: area.into(),
        }
    }
}

/// Ordered rule list. Rules are evaluated in declared order, first match
/// wins; no match means the cell flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn classify(&self, tags: &[String]) -> Option<&AreaName> {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(tags))
            .map(|rule| &rule.area)
    }
}
