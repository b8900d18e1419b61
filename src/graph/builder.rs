// src/graph/builder.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::info;

use crate::element::{DYNAMIC_ATTRIBUTE, Element, ElementId, Status, WorkflowId, check_name};
use crate::errors::{DagwheelError, Result};
use crate::orchestrator::Orchestrator;

/// `consumer.attribute` reads the value of `producer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub consumer: String,
    pub attribute: String,
    pub producer: String,
}

/// Collects named elements and their dependencies, then commits them as one
/// workflow.
///
/// Every problem is reported by [`add`](Self::add),
/// [`connect`](Self::connect) or [`validate`](Self::validate); nothing
/// reaches the orchestrator until the whole graph checks out.
#[derive(Debug)]
pub struct GraphBuilder {
    workflow_id: WorkflowId,
    elements: BTreeMap<String, Element>,
    relations: Vec<Relation>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(WorkflowId::new())
    }
}

impl GraphBuilder {
    pub fn new(workflow_id: WorkflowId) -> Self {
        Self {
            workflow_id,
            elements: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    /// Register `element` under `name`. On error the builder is unchanged.
    pub fn add(&mut self, name: &str, mut element: Element) -> Result<&mut Self> {
        check_name(name)?;
        if self.elements.contains_key(name) {
            return Err(DagwheelError::DuplicateName(name.to_string()));
        }
        if element.status() != Status::New {
            return Err(DagwheelError::InvalidTransition {
                id: element.id(),
                from: element.status(),
                to: Status::Ready,
            });
        }
        element.set_workflow_id(self.workflow_id);
        self.elements.insert(name.to_string(), element);
        Ok(self)
    }

    /// Declare that `consumer` reads `producer` under `attribute`. On error
    /// the builder is unchanged.
    pub fn connect(&mut self, consumer: &str, attribute: &str, producer: &str) -> Result<&mut Self> {
        check_name(attribute)?;
        if attribute == DYNAMIC_ATTRIBUTE {
            return Err(DagwheelError::ReservedAttribute(attribute.to_string()));
        }
        for name in [consumer, producer] {
            if !self.elements.contains_key(name) {
                return Err(DagwheelError::UnknownElement(name.to_string()));
            }
        }
        if consumer == producer {
            return Err(DagwheelError::SelfDependency(consumer.to_string()));
        }
        let taken = self
            .relations
            .iter()
            .any(|r| r.consumer == consumer && r.attribute == attribute);
        if taken {
            return Err(DagwheelError::DuplicateAttribute {
                consumer: consumer.to_string(),
                attribute: attribute.to_string(),
            });
        }

        self.relations.push(Relation {
            consumer: consumer.to_string(),
            attribute: attribute.to_string(),
            producer: producer.to_string(),
        });
        Ok(self)
    }

    pub fn element_id(&self, name: &str) -> Option<ElementId> {
        self.elements.get(name).map(Element::id)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Names of elements that depend on nothing inside this graph.
    pub fn start_nodes(&self) -> Vec<String> {
        let consumers: BTreeSet<&str> = self.relations.iter().map(|r| r.consumer.as_str()).collect();
        self.elements
            .iter()
            .filter(|(name, element)| {
                !consumers.contains(name.as_str()) && element.in_edges().is_empty()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Reject dependency cycles.
    pub fn validate(&self) -> Result<()> {
        // Edge direction: producer -> consumer.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.elements.keys() {
            graph.add_node(name.as_str());
        }
        for r in &self.relations {
            graph.add_edge(r.producer.as_str(), r.consumer.as_str(), ());
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DagwheelError::Cycle(format!(
                "dependency cycle involving element '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Make every start node wait on `producer`, whose input is already
    /// counted as delivered. Returns the ids of the gated elements.
    pub(crate) fn gate_on(&mut self, producer: ElementId) -> Result<Vec<ElementId>> {
        self.validate()?;
        let mut gated = Vec::new();
        for name in self.start_nodes() {
            if let Some(element) = self.elements.get_mut(&name) {
                element.add_input(DYNAMIC_ATTRIBUTE, producer, true);
                gated.push(element.id());
            }
        }
        Ok(gated)
    }

    /// Validate, wire edges and commit every element to `orchestrator`.
    ///
    /// Consumers are committed before their producers, so by the time a
    /// producer can finish everything it must notify is already durable.
    /// The batch becomes schedulable only after all of it is committed.
    pub async fn commit(self, orchestrator: &Orchestrator) -> Result<Vec<ElementId>> {
        self.validate()?;
        let GraphBuilder {
            workflow_id,
            mut elements,
            mut relations,
        } = self;

        for r in &relations {
            let (Some(producer_id), Some(consumer_id)) = (
                elements.get(&r.producer).map(Element::id),
                elements.get(&r.consumer).map(Element::id),
            ) else {
                return Err(DagwheelError::UnknownElement(format!(
                    "{} <- {}",
                    r.consumer, r.producer
                )));
            };
            if let Some(consumer) = elements.get_mut(&r.consumer) {
                consumer.add_input(&r.attribute, producer_id, false);
            }
            if let Some(producer) = elements.get_mut(&r.producer) {
                producer.add_output(consumer_id);
            }
        }

        let mut committed = Vec::with_capacity(elements.len());
        while !elements.is_empty() {
            let producers: BTreeSet<String> = relations.iter().map(|r| r.producer.clone()).collect();
            let batch: Vec<String> = elements
                .keys()
                .filter(|name| !producers.contains(*name))
                .cloned()
                .collect();
            if batch.is_empty() {
                return Err(DagwheelError::Cycle(format!(
                    "no committable element among {:?}",
                    elements.keys().collect::<Vec<_>>()
                )));
            }

            for name in batch {
                let Some(mut element) = elements.remove(&name) else {
                    continue;
                };
                orchestrator.commit(&mut element).await?;
                relations.retain(|r| r.consumer != name);
                committed.push(element);
            }
        }

        let ids: Vec<ElementId> = committed.iter().map(Element::id).collect();
        orchestrator.insert_buffered(committed);
        info!(workflow = %workflow_id, elements = ids.len(), "graph committed");
        Ok(ids)
    }
}
