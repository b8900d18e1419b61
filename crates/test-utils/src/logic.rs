use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dagwheel::element::{Element, ElementContext, ElementLogic, LogicFuture, Outcome};
use dagwheel::wheel::CycleTable;
use serde_json::Value;

type Body = Arc<dyn Fn(&ElementContext) -> anyhow::Result<Outcome> + Send + Sync>;

/// Element logic defined by a closure, for scripting test scenarios.
///
/// Clones share the call counter, so a clone kept by the test observes
/// every execution of the element.
#[derive(Clone)]
pub struct FnLogic {
    type_name: String,
    body: Body,
    recallable: bool,
    persistent: bool,
    cycles: CycleTable,
    calls: Arc<AtomicUsize>,
}

impl fmt::Debug for FnLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLogic")
            .field("type_name", &self.type_name)
            .field("recallable", &self.recallable)
            .field("persistent", &self.persistent)
            .finish()
    }
}

impl FnLogic {
    pub fn new<F>(type_name: &str, body: F) -> Self
    where
        F: Fn(&ElementContext) -> anyhow::Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.to_string(),
            body: Arc::new(body),
            recallable: false,
            persistent: true,
            cycles: CycleTable::default(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always finishes with `value`.
    pub fn returning(type_name: &str, value: Value) -> Self {
        Self::new(type_name, move |_| Ok(Outcome::finish(value.clone())))
    }

    /// Finishes with `value` after recording the inputs it was given.
    pub fn capturing(type_name: &str, value: Value, seen: Seen) -> Self {
        Self::new(type_name, move |ctx| {
            seen.lock().unwrap().push(ctx.inputs().clone());
            Ok(Outcome::finish(value.clone()))
        })
    }

    /// Recalls itself `times` times, then finishes with `value`.
    pub fn recalling(type_name: &str, times: usize, value: Value) -> Self {
        let logic = Self::new(type_name, |_| Ok(Outcome::recall())).recallable(true);
        let calls = Arc::clone(&logic.calls);
        let body: Body = Arc::new(move |_| {
            if calls.load(Ordering::SeqCst) <= times {
                Ok(Outcome::recall())
            } else {
                Ok(Outcome::finish(value.clone()))
            }
        });
        Self { body, ..logic }
    }

    pub fn failing(type_name: &str, message: &'static str) -> Self {
        Self::new(type_name, move |_| Err(anyhow::anyhow!(message)))
    }

    pub fn recallable(mut self, recallable: bool) -> Self {
        self.recallable = recallable;
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn cycles(mut self, cycles: CycleTable) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn element(&self) -> Element {
        Element::new(self.clone())
    }
}

impl ElementLogic for FnLogic {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn execute(&self, ctx: ElementContext) -> LogicFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = (self.body)(&ctx);
        Box::pin(async move { result })
    }

    fn is_recallable(&self) -> bool {
        self.recallable
    }

    fn is_persistent(&self) -> bool {
        self.persistent
    }

    fn cycles(&self) -> CycleTable {
        self.cycles.clone()
    }
}

/// Inputs observed by [`FnLogic::capturing`], one map per execution.
pub type Seen = Arc<Mutex<Vec<BTreeMap<String, Value>>>>;

pub fn seen() -> Seen {
    Arc::new(Mutex::new(Vec::new()))
}
