// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::element::{ElementId, Status};

#[derive(Error, Debug)]
pub enum DagwheelError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("invalid name '{0}': names must be non-empty and must not contain '|'")]
    InvalidName(String),

    #[error("element name '{0}' is already registered in this graph")]
    DuplicateName(String),

    #[error("unknown element name in graph: {0}")]
    UnknownElement(String),

    #[error("element '{consumer}' already has an input named '{attribute}'")]
    DuplicateAttribute { consumer: String, attribute: String },

    #[error("attribute name '{0}' is reserved for dynamic expansion")]
    ReservedAttribute(String),

    #[error("element '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Cycle detected in graph: {0}")]
    Cycle(String),

    #[error("no element type registered under '{0}'")]
    UnknownElementType(String),

    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("element {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: ElementId,
        from: Status,
        to: Status,
    },

    #[error("business logic of element {id} failed: {message}")]
    BusinessLogic { id: ElementId, message: String },

    #[error("store error: {0}")]
    Store(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagwheelError>;
