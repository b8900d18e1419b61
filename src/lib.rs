// src/lib.rs

pub mod cli;
pub mod config;
pub mod element;
pub mod elements;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod orchestrator;
pub mod store;
pub mod types;
pub mod wheel;

mod sync;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, StoreConfig, load_or_default};
use crate::elements::{Constant, Countdown, Print, Sum, builtin_provider};
use crate::engine::{RuntimeOptions, SchedulerLoop};
use crate::errors::Result;
use crate::graph::GraphBuilder;
use crate::orchestrator::Orchestrator;
use crate::store::{DurableStore, MemoryStore, SqliteStore};

const DEMO_SLEEP_INTERVAL: Duration = Duration::from_millis(10);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the durable store
/// - orchestrator recovery
/// - the scheduler loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let store = open_store(&cfg.store).await?;
    let orchestrator = Orchestrator::builder(cfg.engine.clone())
        .store(store)
        .provider(builtin_provider())
        .build();

    let report = orchestrator.recover().await?;
    debug!(?report, "recovery finished");

    let mut driver = SchedulerLoop::new(Arc::clone(&orchestrator));
    let options = match args.command {
        Command::Run { once } => RuntimeOptions {
            exit_when_idle: once,
        },
        Command::Demo => {
            let ids = demo_workflow()?.commit(&orchestrator).await?;
            info!(elements = ids.len(), "demo workflow committed");
            driver = driver.with_sleep_interval(cfg.engine.sleep_interval.min(DEMO_SLEEP_INTERVAL));
            RuntimeOptions {
                exit_when_idle: true,
            }
        }
    };

    // Ctrl-C → graceful shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(true);
    });

    driver.run(options, shutdown_rx).await;
    Ok(())
}

/// Open the store named by the config.
pub async fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn DurableStore>> {
    match cfg {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Sqlite { url } => Ok(Arc::new(SqliteStore::connect(url).await?)),
    }
}

/// `print.total ← sum ← {constant 2, constant 3, countdown 2}`
pub fn demo_workflow() -> Result<GraphBuilder> {
    let mut builder = GraphBuilder::default();
    builder
        .add("two", Constant::element(2)?)?
        .add("three", Constant::element(3)?)?
        .add("polls", Countdown::element(2)?)?
        .add("total", Sum::element())?
        .add("print", Print::element())?
        .connect("total", "a", "two")?
        .connect("total", "b", "three")?
        .connect("total", "c", "polls")?
        .connect("print", "total", "total")?;
    Ok(builder)
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("dagwheel dry-run");
    println!("  engine.max_workers = {}", cfg.engine.max_workers);
    println!(
        "  engine.sleep_interval_ms = {}",
        cfg.engine.sleep_interval.as_millis()
    );
    println!("  engine.default_cycle = {}", cfg.engine.default_cycle);
    match &cfg.store {
        StoreConfig::Memory => println!("  store = memory"),
        StoreConfig::Sqlite { url } => println!("  store = sqlite ({url})"),
    }
    println!();

    println!("cycles ({}):", cfg.engine.cycles.len());
    for (type_name, table) in cfg.engine.cycles.iter() {
        println!("  - {type_name}");
        if let Some(default) = table.default {
            println!("      default: {default}");
        }
        for (status, cycle) in table.per_status.iter() {
            println!("      {status}: {cycle}");
        }
    }

    debug!("dry-run complete (no execution)");
}
