use std::str::FromStr;

use serde::Deserialize;

/// Which durable store backs the orchestrator.
///
/// - `Memory`: state lives only as long as the process.
/// - `Sqlite`: state is written to the database at `[store].url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Sqlite,
}

impl Default for StoreKind {
    fn default() -> Self {
        StoreKind::Memory
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(format!(
                "invalid store.kind: {other} (expected \"memory\" or \"sqlite\")"
            )),
        }
    }
}
