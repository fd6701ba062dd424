//! Area resolver orchestrator.
//!
//! Matching rules and anchor areas are plain data; classification and
//! sentinel resolution are pure functions so the resolver stays stateless
//! and testable. Implementation lives in the private `core` module.

mod core;

pub use core::{
    Area, AreaMap, AreaName, ColumnAnchor, RowAnchor, Rule, RulePredicate, RuleSet, corner_areas,
};
