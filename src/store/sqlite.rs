// src/store/sqlite.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use super::{DurableStore, LoadedRecords};
use crate::element::{ElementId, ElementRecord, Status, WorkflowId};
use crate::errors::{DagwheelError, Result};
use crate::wheel::{Buckets, WheelEntry};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS elements (
        id TEXT PRIMARY KEY NOT NULL,
        workflow_id TEXT NOT NULL,
        type_name TEXT NOT NULL,
        status TEXT NOT NULL,
        value TEXT,
        variables TEXT NOT NULL,
        attributes TEXT NOT NULL,
        in_edges TEXT NOT NULL,
        out_edges TEXT NOT NULL,
        persistent INTEGER NOT NULL,
        last_modified TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wheel (
        cycle INTEGER NOT NULL,
        element_id TEXT NOT NULL,
        status TEXT NOT NULL,
        PRIMARY KEY (cycle, element_id, status)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS status_markers (
        workflow_id TEXT NOT NULL,
        element_id TEXT NOT NULL,
        status TEXT NOT NULL,
        PRIMARY KEY (workflow_id, element_id)
    )
    "#,
];

/// SQLite-backed store. Edge and variable maps are stored as JSON text,
/// statuses as their two-letter codes.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `url` and ensure the
    /// schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        info!(url, "sqlite store ready");
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_id<T: FromStr<Err = uuid::Error>>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|e| DagwheelError::Store(format!("bad id '{raw}': {e}")))
}

fn parse_status(code: &str) -> Result<Status> {
    Status::from_code(code).ok_or_else(|| DagwheelError::Store(format!("bad status code '{code}'")))
}

fn record_from_row(row: &SqliteRow) -> Result<ElementRecord> {
    let id: String = row.try_get("id")?;
    let workflow_id: String = row.try_get("workflow_id")?;
    let status: String = row.try_get("status")?;
    let value: Option<String> = row.try_get("value")?;
    let variables: String = row.try_get("variables")?;
    let attributes: String = row.try_get("attributes")?;
    let in_edges: String = row.try_get("in_edges")?;
    let out_edges: String = row.try_get("out_edges")?;
    let last_modified: DateTime<Utc> = row.try_get("last_modified")?;

    Ok(ElementRecord {
        id: parse_id(&id)?,
        workflow_id: parse_id(&workflow_id)?,
        type_name: row.try_get("type_name")?,
        status: parse_status(&status)?,
        value: value.map(|v| serde_json::from_str(&v)).transpose()?,
        variables: serde_json::from_str(&variables)?,
        attributes: serde_json::from_str(&attributes)?,
        in_edges: serde_json::from_str(&in_edges)?,
        out_edges: serde_json::from_str(&out_edges)?,
        persistent: row.try_get("persistent")?,
        last_modified,
    })
}

fn wheel_entry_from_row(row: &SqliteRow) -> Result<(u32, WheelEntry)> {
    let cycle: i64 = row.try_get("cycle")?;
    let cycle = u32::try_from(cycle)
        .map_err(|_| DagwheelError::Store(format!("bad wheel cycle {cycle}")))?;
    let id: String = row.try_get("element_id")?;
    let status: String = row.try_get("status")?;
    Ok((cycle, (parse_id(&id)?, parse_status(&status)?)))
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn put(&self, record: &ElementRecord) -> Result<()> {
        let value = record.value.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            r#"
            INSERT INTO elements (id, workflow_id, type_name, status, value, variables,
                                  attributes, in_edges, out_edges, persistent, last_modified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                workflow_id = excluded.workflow_id,
                type_name = excluded.type_name,
                status = excluded.status,
                value = excluded.value,
                variables = excluded.variables,
                attributes = excluded.attributes,
                in_edges = excluded.in_edges,
                out_edges = excluded.out_edges,
                persistent = excluded.persistent,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.workflow_id.to_string())
        .bind(&record.type_name)
        .bind(record.status.code())
        .bind(value)
        .bind(serde_json::to_string(&record.variables)?)
        .bind(serde_json::to_string(&record.attributes)?)
        .bind(serde_json::to_string(&record.in_edges)?)
        .bind(serde_json::to_string(&record.out_edges)?)
        .bind(record.persistent)
        .bind(record.last_modified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: ElementId) -> Result<()> {
        sqlx::query("DELETE FROM elements WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<LoadedRecords> {
        let rows = sqlx::query(
            r#"
            SELECT id, workflow_id, type_name, status, value, variables,
                   attributes, in_edges, out_edges, persistent, last_modified
            FROM elements
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut loaded = LoadedRecords::default();
        for row in &rows {
            match record_from_row(row) {
                Ok(record) => loaded.records.push(record),
                Err(e) => {
                    let id: Option<String> = row.try_get("id").ok();
                    warn!(
                        element = id.as_deref().unwrap_or("?"),
                        error = %e,
                        "skipping undecodable element row"
                    );
                    loaded.failures.push(e);
                }
            }
        }
        Ok(loaded)
    }

    async fn swap_status_marker(
        &self,
        workflow_id: WorkflowId,
        id: ElementId,
        _old: Option<Status>,
        new: Status,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO status_markers (workflow_id, element_id, status)
            VALUES (?, ?, ?)
            ON CONFLICT(workflow_id, element_id) DO UPDATE SET status = excluded.status
            "#,
        )
        .bind(workflow_id.to_string())
        .bind(id.to_string())
        .bind(new.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_status_marker(&self, workflow_id: WorkflowId, id: ElementId) -> Result<()> {
        sqlx::query("DELETE FROM status_markers WHERE workflow_id = ? AND element_id = ?")
            .bind(workflow_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn workflow_markers(&self, workflow_id: WorkflowId) -> Result<BTreeMap<ElementId, Status>> {
        let rows = sqlx::query("SELECT element_id, status FROM status_markers WHERE workflow_id = ?")
            .bind(workflow_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let mut markers = BTreeMap::new();
        for row in rows {
            let id: String = row.try_get("element_id")?;
            let status: String = row.try_get("status")?;
            markers.insert(parse_id(&id)?, parse_status(&status)?);
        }
        Ok(markers)
    }

    async fn add_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO wheel (cycle, element_id, status) VALUES (?, ?, ?)")
            .bind(i64::from(cycle))
            .bind(id.to_string())
            .bind(status.code())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_wheel_entry(&self, cycle: u32, id: ElementId, status: Status) -> Result<()> {
        sqlx::query("DELETE FROM wheel WHERE cycle = ? AND element_id = ? AND status = ?")
            .bind(i64::from(cycle))
            .bind(id.to_string())
            .bind(status.code())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn force_remove_wheel_entry(&self, cycle: u32, id: ElementId) -> Result<()> {
        sqlx::query("DELETE FROM wheel WHERE cycle = ? AND element_id = ?")
            .bind(i64::from(cycle))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_status_markers(&self) -> Result<Buckets> {
        let rows = sqlx::query("SELECT cycle, element_id, status FROM wheel")
            .fetch_all(&self.pool)
            .await?;

        let mut buckets = Buckets::new();
        for row in &rows {
            match wheel_entry_from_row(row) {
                Ok((cycle, entry)) => {
                    buckets.entry(cycle).or_default().insert(entry);
                }
                Err(e) => warn!(error = %e, "skipping undecodable wheel row"),
            }
        }
        Ok(buckets)
    }
}
