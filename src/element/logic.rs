// src/element/logic.rs

//! The business-logic seam of an element.

use std::collections::BTreeMap;
use std::sync::Weak;

use futures::future::BoxFuture;
use serde_json::Value;

use super::element::Variables;
use super::id::{ElementId, WorkflowId, check_name};
use crate::errors::Result;
use crate::graph::GraphBuilder;
use crate::orchestrator::Orchestrator;
use crate::wheel::CycleTable;

pub type LogicFuture = BoxFuture<'static, anyhow::Result<Outcome>>;

/// Business logic attached to an element.
///
/// `execute` runs on a worker, never on the scheduler loop. It returns an
/// owned future so the worker does not borrow the logic object.
pub trait ElementLogic: Send + Sync {
    /// Stable name used to re-instantiate the logic on recovery.
    fn type_name(&self) -> &str;

    fn execute(&self, ctx: ElementContext) -> LogicFuture;

    /// Whether a `Running` element may be sent back to `Ready`.
    fn is_recallable(&self) -> bool {
        false
    }

    /// Non-persistent elements never touch the durable store.
    fn is_persistent(&self) -> bool {
        true
    }

    /// Per-status wheel cycles declared by this element type.
    fn cycles(&self) -> CycleTable {
        CycleTable::default()
    }
}

/// What an execution produced.
#[derive(Debug)]
pub enum Outcome {
    /// Work is done. `variables`, when present, replace the element's
    /// variables. `expansion` is a graph spawned by this completion.
    Finish {
        value: Value,
        variables: Option<Variables>,
        expansion: Option<GraphBuilder>,
    },
    /// Run again later with the same inputs.
    Recall { variables: Option<Variables> },
}

impl Outcome {
    pub fn finish(value: impl Into<Value>) -> Self {
        Outcome::Finish {
            value: value.into(),
            variables: None,
            expansion: None,
        }
    }

    /// Finish and commit `builder` as a continuation of this element.
    pub fn expand(value: impl Into<Value>, builder: GraphBuilder) -> Self {
        Outcome::Finish {
            value: value.into(),
            variables: None,
            expansion: Some(builder),
        }
    }

    pub fn recall() -> Self {
        Outcome::Recall { variables: None }
    }

    pub fn with_variables(self, vars: Variables) -> Self {
        match self {
            Outcome::Finish {
                value, expansion, ..
            } => Outcome::Finish {
                value,
                variables: Some(vars),
                expansion,
            },
            Outcome::Recall { .. } => Outcome::Recall {
                variables: Some(vars),
            },
        }
    }
}

/// Everything an execution may look at.
///
/// Input values are resolved when the element is dispatched: each attribute
/// maps to the current value of its producer (`null` if it has none).
pub struct ElementContext {
    id: ElementId,
    workflow_id: WorkflowId,
    inputs: BTreeMap<String, Value>,
    variables: Variables,
    orchestrator: Weak<Orchestrator>,
}

impl ElementContext {
    pub(crate) fn new(
        id: ElementId,
        workflow_id: WorkflowId,
        inputs: BTreeMap<String, Value>,
        variables: Variables,
        orchestrator: Weak<Orchestrator>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            inputs,
            variables,
            orchestrator,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn input(&self, attribute: &str) -> Option<&Value> {
        self.inputs.get(attribute)
    }

    pub fn inputs(&self) -> &BTreeMap<String, Value> {
        &self.inputs
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn into_variables(self) -> Variables {
        self.variables
    }

    /// Update a variable and persist it right away, without waiting for
    /// the execution to finish.
    pub async fn set_variable(&mut self, name: &str, value: Value) -> Result<()> {
        check_name(name)?;
        self.variables.insert(name.to_string(), value.clone());
        if let Some(orchestrator) = self.orchestrator.upgrade() {
            orchestrator.set_variable(self.id, name, value).await?;
        }
        Ok(())
    }
}
