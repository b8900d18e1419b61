// src/orchestrator/table.rs

use std::collections::HashMap;
use std::sync::Mutex;

use crate::element::{Element, ElementId, ElementRecord};
use crate::sync::lock;

/// In-memory elements, with a shadow map for elements committed by workers
/// that the scheduler has not merged yet.
#[derive(Debug, Default)]
pub(crate) struct ElementTable {
    live: Mutex<HashMap<ElementId, Element>>,
    pending: Mutex<HashMap<ElementId, Element>>,
}

impl ElementTable {
    pub(crate) fn insert_pending(&self, elements: Vec<Element>) {
        let mut pending = lock(&self.pending);
        for element in elements {
            pending.insert(element.id(), element);
        }
    }

    pub(crate) fn flush_pending(&self) {
        let drained = std::mem::take(&mut *lock(&self.pending));
        if !drained.is_empty() {
            lock(&self.live).extend(drained);
        }
    }

    pub(crate) fn replace(&self, elements: Vec<Element>) {
        *lock(&self.live) = elements.into_iter().map(|e| (e.id(), e)).collect();
        lock(&self.pending).clear();
    }

    pub(crate) fn get(&self, id: ElementId) -> Option<Element> {
        if let Some(element) = lock(&self.live).get(&id) {
            return Some(element.clone());
        }
        lock(&self.pending).get(&id).cloned()
    }

    /// Apply `f` to the element wherever it currently lives.
    pub(crate) fn update<R>(&self, id: ElementId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        {
            let mut live = lock(&self.live);
            if let Some(element) = live.get_mut(&id) {
                return Some(f(element));
            }
        }
        lock(&self.pending).get_mut(&id).map(f)
    }

    pub(crate) fn remove(&self, id: ElementId) -> Option<Element> {
        if let Some(element) = lock(&self.live).remove(&id) {
            return Some(element);
        }
        lock(&self.pending).remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.live).len() + lock(&self.pending).len()
    }

    pub(crate) fn ids_with<P>(&self, predicate: P) -> Vec<ElementId>
    where
        P: Fn(&Element) -> bool,
    {
        let mut ids: Vec<ElementId> = lock(&self.live)
            .values()
            .chain(lock(&self.pending).values())
            .filter(|e| predicate(e))
            .map(Element::id)
            .collect();
        ids.sort();
        ids
    }

    pub(crate) fn records(&self) -> Vec<ElementRecord> {
        let mut records: Vec<ElementRecord> = lock(&self.live)
            .values()
            .chain(lock(&self.pending).values())
            .map(|e| e.record().clone())
            .collect();
        records.sort_by_key(|r| r.id);
        records
    }
}
