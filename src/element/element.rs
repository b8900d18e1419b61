// src/element/element.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::{ElementId, WorkflowId, check_name};
use super::logic::ElementLogic;
use super::status::Status;
use crate::errors::Result;

/// Named, JSON-valued variables owned by an element.
pub type Variables = BTreeMap<String, Value>;

/// Persistable state of an element.
///
/// This is exactly what a [`DurableStore`](crate::store::DurableStore)
/// writes and reads back on recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: ElementId,
    pub workflow_id: WorkflowId,
    pub type_name: String,
    pub status: Status,
    pub value: Option<Value>,
    pub variables: Variables,
    /// attribute name → producer id.
    pub attributes: BTreeMap<String, ElementId>,
    /// producer id → whether that producer's output has been delivered.
    pub in_edges: BTreeMap<ElementId, bool>,
    /// consumer id → whether that consumer has acknowledged.
    pub out_edges: BTreeMap<ElementId, bool>,
    pub persistent: bool,
    pub last_modified: DateTime<Utc>,
}

impl ElementRecord {
    pub fn all_inputs_delivered(&self) -> bool {
        self.in_edges.values().all(|delivered| *delivered)
    }

    pub fn all_outputs_acknowledged(&self) -> bool {
        self.out_edges.values().all(|acked| *acked)
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}

/// A workflow element: persistable record plus business logic.
///
/// Cloning is cheap-ish: the record is cloned, the logic is shared.
#[derive(Clone)]
pub struct Element {
    record: ElementRecord,
    logic: Arc<dyn ElementLogic>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl Element {
    /// Create a fresh element in status `New`.
    pub fn new<L>(logic: L) -> Self
    where
        L: ElementLogic + 'static,
    {
        Self::from_logic(Arc::new(logic))
    }

    pub fn from_logic(logic: Arc<dyn ElementLogic>) -> Self {
        let record = ElementRecord {
            id: ElementId::new(),
            workflow_id: WorkflowId::new(),
            type_name: logic.type_name().to_string(),
            status: Status::New,
            value: None,
            variables: Variables::new(),
            attributes: BTreeMap::new(),
            in_edges: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            persistent: logic.is_persistent(),
            last_modified: Utc::now(),
        };
        Self { record, logic }
    }

    /// Re-attach logic to a record loaded from a store.
    pub fn restore(record: ElementRecord, logic: Arc<dyn ElementLogic>) -> Self {
        Self { record, logic }
    }

    /// Set a variable before the element is committed.
    pub fn with_variable(mut self, name: &str, value: impl Into<Value>) -> Result<Self> {
        check_name(name)?;
        self.record.variables.insert(name.to_string(), value.into());
        Ok(self)
    }

    pub fn id(&self) -> ElementId {
        self.record.id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.record.workflow_id
    }

    pub fn type_name(&self) -> &str {
        &self.record.type_name
    }

    pub fn status(&self) -> Status {
        self.record.status
    }

    pub fn value(&self) -> Option<&Value> {
        self.record.value.as_ref()
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.record.variables.get(name)
    }

    pub fn variables(&self) -> &Variables {
        &self.record.variables
    }

    pub fn attributes(&self) -> &BTreeMap<String, ElementId> {
        &self.record.attributes
    }

    pub fn in_edges(&self) -> &BTreeMap<ElementId, bool> {
        &self.record.in_edges
    }

    pub fn out_edges(&self) -> &BTreeMap<ElementId, bool> {
        &self.record.out_edges
    }

    pub fn is_persistent(&self) -> bool {
        self.record.persistent
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.record.last_modified
    }

    pub fn all_inputs_delivered(&self) -> bool {
        self.record.all_inputs_delivered()
    }

    pub fn all_outputs_acknowledged(&self) -> bool {
        self.record.all_outputs_acknowledged()
    }

    pub fn record(&self) -> &ElementRecord {
        &self.record
    }

    pub fn into_record(self) -> ElementRecord {
        self.record
    }

    pub fn logic(&self) -> &Arc<dyn ElementLogic> {
        &self.logic
    }

    pub(crate) fn record_mut(&mut self) -> &mut ElementRecord {
        &mut self.record
    }

    pub(crate) fn set_workflow_id(&mut self, workflow_id: WorkflowId) {
        self.record.workflow_id = workflow_id;
    }

    /// Register `producer` as the source of input `attribute`.
    pub(crate) fn add_input(&mut self, attribute: &str, producer: ElementId, delivered: bool) {
        self.record.attributes.insert(attribute.to_string(), producer);
        self.record.in_edges.insert(producer, delivered);
    }

    /// Register `consumer` as waiting on this element's output.
    pub(crate) fn add_output(&mut self, consumer: ElementId) {
        self.record.out_edges.insert(consumer, false);
    }
}
