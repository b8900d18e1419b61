// src/config/model.rs

//! Configuration model.
//!
//! [`RawConfigFile`] mirrors the TOML layout. [`ConfigFile`] is the
//! validated form the rest of the crate consumes; see
//! [`validate`](crate::config::validate).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::element::Status;
use crate::types::StoreKind;
use crate::wheel::CycleTable;

pub const DEFAULT_MAX_WORKERS: usize = 100;
pub const DEFAULT_SLEEP_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_CYCLE: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: RawEngineSection,
    #[serde(default)]
    pub store: RawStoreSection,
    /// element type name → cycle overrides
    #[serde(default)]
    pub cycles: BTreeMap<String, RawCycleTable>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawEngineSection {
    pub max_workers: usize,
    pub sleep_interval_ms: u64,
    pub default_cycle: u32,
}

impl Default for RawEngineSection {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            sleep_interval_ms: DEFAULT_SLEEP_INTERVAL_MS,
            default_cycle: DEFAULT_CYCLE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStoreSection {
    #[serde(default)]
    pub kind: StoreKind,
    pub url: Option<String>,
}

/// `[cycles.<type>]`: an optional `default` plus one key per status name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCycleTable {
    pub default: Option<u32>,
    #[serde(flatten)]
    pub statuses: BTreeMap<String, u32>,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub engine: EngineConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_workers: usize,
    pub sleep_interval: Duration,
    pub default_cycle: u32,
    pub cycles: BTreeMap<String, CycleTable>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            sleep_interval: Duration::from_millis(DEFAULT_SLEEP_INTERVAL_MS),
            default_cycle: DEFAULT_CYCLE,
            cycles: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn with_default_cycle(mut self, cycle: u32) -> Self {
        self.default_cycle = cycle;
        self
    }

    pub fn with_sleep_interval(mut self, interval: Duration) -> Self {
        self.sleep_interval = interval;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_cycles(mut self, type_name: impl Into<String>, table: CycleTable) -> Self {
        self.cycles.insert(type_name.into(), table);
        self
    }

    /// Cycle an element of `type_name` uses while waiting in `status`.
    ///
    /// Configured overrides win over what the type declares; the engine
    /// default applies when neither has an entry.
    pub fn cycle_for(&self, type_name: &str, declared: &CycleTable, status: Status) -> u32 {
        match self.cycles.get(type_name) {
            Some(configured) => configured
                .overlay(declared)
                .resolve(status, self.default_cycle),
            None => declared.resolve(status, self.default_cycle),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        url: String,
    },
}
