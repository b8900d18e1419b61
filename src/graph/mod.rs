// src/graph/mod.rs

//! Declarative construction of element graphs.

mod builder;

pub use builder::{GraphBuilder, Relation};
