use std::sync::Arc;
use std::time::Duration;

use dagwheel::config::EngineConfig;
use dagwheel::element::ElementProvider;
use dagwheel::orchestrator::Orchestrator;
use dagwheel::store::{DurableStore, MemoryStore};

use crate::executor::InlineExecutor;
use crate::handler::RecordingHandler;

/// Every cycle 1, no idle sleep.
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_default_cycle(1)
        .with_sleep_interval(Duration::ZERO)
}

/// An orchestrator wired to an inline executor and a recording handler.
pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<dyn DurableStore>,
    pub provider: ElementProvider,
    pub handler: RecordingHandler,
    pub executor: InlineExecutor,
    config: EngineConfig,
}

impl Harness {
    pub fn new(provider: ElementProvider) -> Self {
        Self::on_store(Arc::new(MemoryStore::new()), provider)
    }

    pub fn on_store(store: Arc<dyn DurableStore>, provider: ElementProvider) -> Self {
        Self::with_config(test_config(), store, provider)
    }

    pub fn with_config(
        config: EngineConfig,
        store: Arc<dyn DurableStore>,
        provider: ElementProvider,
    ) -> Self {
        let handler = RecordingHandler::new();
        let executor = InlineExecutor::new();
        let orchestrator = Orchestrator::builder(config.clone())
            .store(Arc::clone(&store))
            .provider(provider.clone())
            .handler(Arc::new(handler.clone()))
            .executor(Arc::new(executor.clone()))
            .build();
        Self {
            orchestrator,
            store,
            provider,
            handler,
            executor,
            config,
        }
    }

    /// A fresh orchestrator over the same store, as after a process restart.
    pub fn restart(&self) -> Harness {
        Self::with_config(self.config.clone(), Arc::clone(&self.store), self.provider.clone())
    }

    /// Tick `n` times.
    pub async fn ticks(&self, n: usize) {
        for _ in 0..n {
            self.orchestrator.tick().await;
        }
    }

    /// Tick until `done` holds, at most `max_ticks` times. Returns whether
    /// the condition was met.
    pub async fn tick_until<P>(&self, max_ticks: usize, mut done: P) -> bool
    where
        P: FnMut(&Orchestrator) -> bool,
    {
        for _ in 0..max_ticks {
            if done(&self.orchestrator) {
                return true;
            }
            self.orchestrator.tick().await;
        }
        done(&self.orchestrator)
    }

    /// Tick until no element is left. Returns the number of ticks taken, or
    /// `None` if `max_ticks` was not enough.
    pub async fn drain(&self, max_ticks: usize) -> Option<usize> {
        for n in 0..=max_ticks {
            if self.orchestrator.is_idle() {
                return Some(n);
            }
            self.orchestrator.tick().await;
        }
        None
    }
}
