// tests/wheel.rs

mod common;
use crate::common::harness::{Harness, test_config};

use std::error::Error;
use std::sync::Arc;

use dagwheel::config::EngineConfig;
use dagwheel::element::{ElementId, Status};
use dagwheel::elements::{Countdown, builtin_provider};
use dagwheel::graph::GraphBuilder;
use dagwheel::store::MemoryStore;
use dagwheel::wheel::{CycleTable, SchedulingWheel, TickCounter};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn inserts_are_invisible_until_flushed() {
    let wheel = SchedulingWheel::new();
    let id = ElementId::new();
    wheel.insert(1, id, Status::Ready);

    assert!(!wheel.is_empty());
    assert!(wheel.due().is_empty());

    wheel.flush_pending();
    assert_eq!(wheel.due(), vec![(1, vec![id])]);
}

#[test]
fn buckets_fire_when_the_counter_is_divisible_by_their_cycle() {
    let wheel = SchedulingWheel::new();
    let every_second = ElementId::new();
    let every_third = ElementId::new();
    wheel.insert(2, every_second, Status::Ready);
    wheel.insert(3, every_third, Status::Pending);
    wheel.flush_pending();

    let mut fired = Vec::new();
    for _ in 1..=6 {
        let counter = wheel.counter();
        let cycles: Vec<u32> = wheel.due().into_iter().map(|(cycle, _)| cycle).collect();
        fired.push((counter, cycles));
    }

    assert_eq!(
        fired,
        vec![
            (1, vec![]),
            (2, vec![2]),
            (3, vec![3]),
            (4, vec![2]),
            (5, vec![]),
            (6, vec![2, 3]),
        ]
    );
    assert_eq!(wheel.counter(), 7);
}

#[test]
fn an_id_is_due_once_per_bucket_whatever_its_statuses() {
    let wheel = SchedulingWheel::new();
    let id = ElementId::new();
    wheel.insert(1, id, Status::Pending);
    wheel.insert(1, id, Status::Ready);
    wheel.flush_pending();

    assert_eq!(wheel.len(), 2);
    assert_eq!(wheel.due(), vec![(1, vec![id])]);
}

#[test]
fn remove_reaches_unflushed_entries() {
    let wheel = SchedulingWheel::new();
    let id = ElementId::new();
    wheel.insert(4, id, Status::Ready);

    assert!(wheel.remove(4, id, Status::Ready));
    assert!(wheel.is_empty());
    assert!(!wheel.remove(4, id, Status::Ready));
}

#[test]
fn force_remove_drops_every_status_of_an_id() {
    let wheel = SchedulingWheel::new();
    let id = ElementId::new();
    let other = ElementId::new();
    wheel.insert(1, id, Status::Pending);
    wheel.flush_pending();
    wheel.insert(1, id, Status::Ready);
    wheel.insert(1, other, Status::Ready);

    assert_eq!(wheel.force_remove(1, id), 2);
    assert!(wheel.entries_for(id).is_empty());
    assert_eq!(wheel.entries_for(other), vec![(1, Status::Ready)]);
}

#[test]
fn empty_buckets_are_dropped() {
    let wheel = SchedulingWheel::new();
    let id = ElementId::new();
    wheel.insert(3, id, Status::Destroyable);
    wheel.flush_pending();
    wheel.remove(3, id, Status::Destroyable);

    assert!(wheel.snapshot().is_empty());
    assert!(wheel.is_empty());
}

#[test]
fn counter_starts_at_one_and_never_reaches_zero() {
    assert_eq!(TickCounter::default().get(), 1);
    assert_eq!(TickCounter::starting_at(0).get(), 1);

    let wheel = SchedulingWheel::with_counter(TickCounter::starting_at(u32::MAX));
    wheel.insert(1, ElementId::new(), Status::Ready);
    wheel.flush_pending();
    wheel.due();
    assert_eq!(wheel.counter(), 1);
}

#[test]
fn cycle_table_resolution_order() {
    let table = CycleTable::new()
        .with_default(4)
        .with_status(Status::Ready, 2)
        .with_status(Status::Pending, 0);

    assert_eq!(table.resolve(Status::Ready, 10), 2);
    assert_eq!(table.resolve(Status::NotifyFinish, 10), 4);
    // zero is ignored
    assert_eq!(table.resolve(Status::Pending, 10), 4);
    assert_eq!(CycleTable::new().resolve(Status::Ready, 10), 10);
    assert_eq!(CycleTable::new().resolve(Status::Ready, 0), 1);
}

#[test]
fn overlay_prefers_the_upper_table() {
    let declared = CycleTable::new()
        .with_default(3)
        .with_status(Status::Ready, 2)
        .with_status(Status::Pending, 7);
    let configured = CycleTable::new().with_status(Status::Ready, 5);

    let merged = configured.overlay(&declared);
    assert_eq!(merged.resolve(Status::Ready, 10), 5);
    assert_eq!(merged.resolve(Status::Pending, 10), 7);
    assert_eq!(merged.resolve(Status::Destroyable, 10), 3);
}

#[test]
fn engine_config_layers_configured_over_declared_cycles() {
    let declared = CycleTable::new().with_status(Status::Ready, 2);
    let config = EngineConfig::default()
        .with_default_cycle(8)
        .with_cycles("countdown", CycleTable::new().with_default(6));

    assert_eq!(config.cycle_for("countdown", &declared, Status::Ready), 2);
    assert_eq!(config.cycle_for("countdown", &declared, Status::Pending), 6);
    assert_eq!(config.cycle_for("sum", &CycleTable::new(), Status::Pending), 8);
}

#[tokio::test]
async fn elements_are_queued_on_their_resolved_cycle() -> TestResult {
    let mut builder = GraphBuilder::default();
    builder.add("polls", Countdown::element(2)?)?;
    let id = builder.element_id("polls").ok_or("missing polls")?;
    let h = Harness::new(builtin_provider());
    builder.commit(&h.orchestrator).await?;

    assert_eq!(h.orchestrator.wheel_entries(id), vec![(2, Status::Ready)]);
    Ok(())
}

#[tokio::test]
async fn configured_cycles_override_declared_ones() -> TestResult {
    let config =
        test_config().with_cycles("countdown", CycleTable::new().with_status(Status::Ready, 5));
    let h = Harness::with_config(config, Arc::new(MemoryStore::new()), builtin_provider());

    let mut builder = GraphBuilder::default();
    builder.add("polls", Countdown::element(2)?)?;
    let id = builder.element_id("polls").ok_or("missing polls")?;
    builder.commit(&h.orchestrator).await?;

    assert_eq!(h.orchestrator.wheel_entries(id), vec![(5, Status::Ready)]);

    // nothing fires before the fifth tick
    h.ticks(4).await;
    assert_eq!(h.executor.executed(), 0);
    h.orchestrator.tick().await;
    assert_eq!(h.executor.executed(), 1);
    Ok(())
}
