// src/wheel/cycles.rs

use std::collections::BTreeMap;

use crate::element::Status;

/// Wheel cycles for one element type.
///
/// Lookup order is per-status entry, then the type-wide `default`, then the
/// engine-wide default. Zero never counts as a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleTable {
    pub default: Option<u32>,
    pub per_status: BTreeMap<Status, u32>,
}

impl CycleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, cycle: u32) -> Self {
        self.default = Some(cycle);
        self
    }

    pub fn with_status(mut self, status: Status, cycle: u32) -> Self {
        self.per_status.insert(status, cycle);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.per_status.is_empty()
    }

    /// Layer `self` on top of `base`: entries in `self` win.
    pub fn overlay(&self, base: &CycleTable) -> CycleTable {
        let mut per_status = base.per_status.clone();
        per_status.extend(self.per_status.iter().map(|(s, c)| (*s, *c)));
        CycleTable {
            default: self.default.or(base.default),
            per_status,
        }
    }

    pub fn resolve(&self, status: Status, fallback: u32) -> u32 {
        self.per_status
            .get(&status)
            .copied()
            .filter(|c| *c > 0)
            .or(self.default.filter(|c| *c > 0))
            .unwrap_or(fallback)
            .max(1)
    }
}
