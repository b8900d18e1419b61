// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, EngineConfig, RawConfigFile, RawCycleTable, StoreConfig};
use crate::element::{Status, is_valid_name};
use crate::errors::{DagwheelError, Result};
use crate::types::StoreKind;
use crate::wheel::CycleTable;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DagwheelError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_engine(&raw)?;
        let store = validate_store(&raw)?;
        let cycles = validate_cycles(&raw)?;

        Ok(ConfigFile {
            engine: EngineConfig {
                max_workers: raw.engine.max_workers,
                sleep_interval: Duration::from_millis(raw.engine.sleep_interval_ms),
                default_cycle: raw.engine.default_cycle,
                cycles,
            },
            store,
        })
    }
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.max_workers == 0 {
        return Err(DagwheelError::ConfigError(
            "[engine].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.engine.default_cycle == 0 {
        return Err(DagwheelError::ConfigError(
            "[engine].default_cycle must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<StoreConfig> {
    match (cfg.store.kind, cfg.store.url.as_deref()) {
        (StoreKind::Memory, _) => Ok(StoreConfig::Memory),
        (StoreKind::Sqlite, Some(url)) if !url.trim().is_empty() => Ok(StoreConfig::Sqlite {
            url: url.to_string(),
        }),
        (StoreKind::Sqlite, _) => Err(DagwheelError::ConfigError(
            "[store].url is required when kind = \"sqlite\"".to_string(),
        )),
    }
}

fn validate_cycles(cfg: &RawConfigFile) -> Result<BTreeMap<String, CycleTable>> {
    let mut tables = BTreeMap::new();
    for (type_name, raw) in cfg.cycles.iter() {
        if !is_valid_name(type_name) {
            return Err(DagwheelError::ConfigError(format!(
                "[cycles.{type_name}]: invalid element type name"
            )));
        }
        tables.insert(type_name.clone(), cycle_table(type_name, raw)?);
    }
    Ok(tables)
}

fn cycle_table(type_name: &str, raw: &RawCycleTable) -> Result<CycleTable> {
    let mut table = CycleTable::new();
    if let Some(default) = raw.default {
        ensure_positive(type_name, "default", default)?;
        table = table.with_default(default);
    }
    for (key, cycle) in raw.statuses.iter() {
        let status: Status = key
            .parse()
            .map_err(|e: String| DagwheelError::ConfigError(format!("[cycles.{type_name}]: {e}")))?;
        if matches!(status, Status::New | Status::Running | Status::Destroyed) {
            return Err(DagwheelError::ConfigError(format!(
                "[cycles.{type_name}].{key}: elements are never queued in status {status}"
            )));
        }
        ensure_positive(type_name, key, *cycle)?;
        table = table.with_status(status, *cycle);
    }
    Ok(table)
}

fn ensure_positive(type_name: &str, key: &str, cycle: u32) -> Result<()> {
    if cycle == 0 {
        return Err(DagwheelError::ConfigError(format!(
            "[cycles.{type_name}].{key} must be >= 1 (got 0)"
        )));
    }
    Ok(())
}
