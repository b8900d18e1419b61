// src/element/provider.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::element::{Element, ElementRecord};
use super::logic::ElementLogic;
use crate::errors::{DagwheelError, Result};

type Factory = Arc<dyn Fn() -> Arc<dyn ElementLogic> + Send + Sync>;

/// Registry from type name to logic factory.
///
/// Used on recovery to turn stored records back into live elements.
#[derive(Clone, Default)]
pub struct ElementProvider {
    factories: BTreeMap<String, Factory>,
}

impl fmt::Debug for ElementProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementProvider")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ElementProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, L>(&mut self, type_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> L + Send + Sync + 'static,
        L: ElementLogic + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as Arc<dyn ElementLogic>);
        self.factories.insert(type_name.into(), factory);
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<F, L>(mut self, type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> L + Send + Sync + 'static,
        L: ElementLogic + 'static,
    {
        self.register(type_name, factory);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn logic(&self, type_name: &str) -> Result<Arc<dyn ElementLogic>> {
        self.factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| DagwheelError::UnknownElementType(type_name.to_string()))
    }

    /// A fresh, uncommitted element of the given type.
    pub fn instantiate(&self, type_name: &str) -> Result<Element> {
        Ok(Element::from_logic(self.logic(type_name)?))
    }

    /// Pair a stored record with newly created logic of its type.
    pub fn restore(&self, record: ElementRecord) -> Result<Element> {
        let logic = self.logic(&record.type_name)?;
        Ok(Element::restore(record, logic))
    }
}
