// src/element/mod.rs

//! Elements: the unit of work in a workflow graph.
//!
//! An element pairs a persistable [`ElementRecord`] with the
//! [`ElementLogic`] that knows how to execute it. Identity, status and the
//! edge maps live in the record. The logic is re-attached through an
//! [`ElementProvider`] when records are reloaded from a store.

mod element;
mod id;
mod logic;
mod provider;
mod status;

pub use element::{Element, ElementRecord, Variables};
pub use id::{DYNAMIC_ATTRIBUTE, ElementId, NAME_SEPARATOR, WorkflowId, check_name, is_valid_name};
pub use logic::{ElementContext, ElementLogic, LogicFuture, Outcome};
pub use provider::ElementProvider;
pub use status::Status;
