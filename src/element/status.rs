// src/element/status.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an element.
///
/// The forward path is
/// `New → Pending → Ready → Running → NotifyFinish → NotifiedOutput →
/// NotifiedInput → Destroyable → Destroyed`, with `Pending` skipped when an
/// element has no undelivered inputs and a `Running → Ready` back-edge for
/// recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    New,
    Pending,
    Ready,
    Running,
    NotifyFinish,
    NotifiedOutput,
    NotifiedInput,
    Destroyable,
    Destroyed,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::New,
        Status::Pending,
        Status::Ready,
        Status::Running,
        Status::NotifyFinish,
        Status::NotifiedOutput,
        Status::NotifiedInput,
        Status::Destroyable,
        Status::Destroyed,
    ];

    /// Two-letter code used for persisted status markers.
    pub fn code(self) -> &'static str {
        match self {
            Status::New => "NW",
            Status::Pending => "PI",
            Status::Ready => "RD",
            Status::Running => "RI",
            Status::NotifyFinish => "NF",
            Status::NotifiedOutput => "NO",
            Status::NotifiedInput => "NI",
            Status::Destroyable => "DA",
            Status::Destroyed => "DD",
        }
    }

    pub fn from_code(code: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Whether entering this status immediately places the element in the
    /// scheduling wheel.
    ///
    /// `Pending` and `NotifiedInput` are only enqueued by a neighbour once
    /// the element's condition is met; `Running` and `Destroyed` never are.
    pub fn is_enqueued_on_entry(self) -> bool {
        matches!(
            self,
            Status::Ready | Status::NotifyFinish | Status::NotifiedOutput | Status::Destroyable
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Status {
    type Err = String;

    /// Accepts `notify_finish`, `NotifyFinish`, `notifyfinish` and the
    /// two-letter code `NF` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(status) = Status::from_code(trimmed) {
            return Ok(status);
        }
        let normalized: String = trimmed
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.to_string().to_lowercase() == normalized)
            .ok_or_else(|| format!("unknown element status: {s}"))
    }
}
