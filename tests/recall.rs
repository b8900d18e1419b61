// tests/recall.rs

mod common;
use crate::common::harness::Harness;
use crate::common::logic::FnLogic;
use crate::common::{init_tracing, test_provider};

use std::error::Error;
use std::sync::Arc;

use dagwheel::element::{ElementContext, ElementLogic, ElementProvider, LogicFuture, Outcome, Status};
use dagwheel::elements::Countdown;
use dagwheel::graph::GraphBuilder;
use dagwheel::errors::DagwheelError;
use dagwheel::store::MemoryStore;
use serde_json::json;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn recall_capable_element_runs_until_it_finishes() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let poller = FnLogic::recalling("poller", 3, json!(9));

    let mut builder = GraphBuilder::default();
    builder.add("x", poller.element())?;
    let ids = builder.commit(&h.orchestrator).await?;
    let x = ids[0];

    h.ticks(3).await;
    assert_eq!(poller.calls(), 3);
    assert_eq!(h.orchestrator.status_of(x), Some(Status::Ready));
    assert_eq!(h.orchestrator.wheel_entries(x), vec![(1, Status::Ready)]);

    h.orchestrator.tick().await;
    assert_eq!(poller.calls(), 4);
    assert_eq!(h.orchestrator.status_of(x), Some(Status::NotifyFinish));
    assert_eq!(h.orchestrator.value_of(x), Some(json!(9)));

    assert!(h.drain(10).await.is_some());
    assert_eq!(poller.calls(), 4);
    Ok(())
}

#[tokio::test]
async fn recall_from_a_non_recallable_element_is_rejected() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let stubborn = FnLogic::new("stubborn", |_| Ok(Outcome::recall()));

    let mut builder = GraphBuilder::default();
    builder.add("x", stubborn.element())?;
    let ids = builder.commit(&h.orchestrator).await?;
    let x = ids[0];

    h.ticks(3).await;
    assert_eq!(stubborn.calls(), 1);
    assert_eq!(h.orchestrator.status_of(x), Some(Status::Running));
    assert!(h.orchestrator.wheel_entries(x).is_empty());
    assert!(h.handler.contains("cannot move from Running to Ready"));

    assert!(!h.orchestrator.recall(x).await?);
    Ok(())
}

#[tokio::test]
async fn recall_outside_running_returns_false() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let poller = FnLogic::recalling("poller", 1, json!(null));

    let mut builder = GraphBuilder::default();
    builder.add("x", poller.element())?;
    let ids = builder.commit(&h.orchestrator).await?;

    assert_eq!(h.orchestrator.status_of(ids[0]), Some(Status::Ready));
    assert!(!h.orchestrator.recall(ids[0]).await?);
    assert_eq!(h.orchestrator.status_of(ids[0]), Some(Status::Ready));
    Ok(())
}

#[tokio::test]
async fn countdown_keeps_its_variables_across_recalls() -> TestResult {
    init_tracing();
    let h = Harness::new(test_provider());

    let mut builder = GraphBuilder::default();
    builder.add("wait", Countdown::element(2)?)?;
    let ids = builder.commit(&h.orchestrator).await?;
    let wait = ids[0];

    // Countdown declares a Ready cycle of 2.
    assert_eq!(h.orchestrator.wheel_entries(wait), vec![(2, Status::Ready)]);

    let finished = h
        .tick_until(20, |o| o.status_of(wait) == Some(Status::NotifyFinish))
        .await;
    assert!(finished);
    assert_eq!(h.orchestrator.value_of(wait), Some(json!(2)));

    let element = h.orchestrator.element(wait).ok_or("countdown not live")?;
    assert_eq!(element.variable("remaining"), Some(&json!(0)));
    assert_eq!(element.variable("polls"), Some(&json!(2)));
    Ok(())
}

/// Records its progress through the context, then recalls once.
struct Checkpointing;

impl ElementLogic for Checkpointing {
    fn type_name(&self) -> &str {
        "checkpointing"
    }

    fn execute(&self, mut ctx: ElementContext) -> LogicFuture {
        Box::pin(async move {
            let runs = ctx.variable("runs").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            ctx.set_variable("runs", json!(runs)).await?;
            if runs < 2 {
                Ok(Outcome::recall())
            } else {
                Ok(Outcome::finish(runs))
            }
        })
    }

    fn is_recallable(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn variables_set_during_execution_are_persisted() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let h = Harness::on_store(Arc::new(store.clone()), ElementProvider::new());

    let mut builder = GraphBuilder::default();
    builder.add("c", dagwheel::element::Element::new(Checkpointing))?;
    let ids = builder.commit(&h.orchestrator).await?;
    let c = ids[0];

    h.orchestrator.tick().await;
    assert_eq!(h.orchestrator.status_of(c), Some(Status::Ready));
    let stored = store.record(c).ok_or("record missing")?;
    assert_eq!(stored.variables.get("runs"), Some(&json!(1)));

    h.orchestrator.tick().await;
    assert_eq!(h.orchestrator.status_of(c), Some(Status::NotifyFinish));
    assert_eq!(h.orchestrator.value_of(c), Some(json!(2)));
    Ok(())
}

#[tokio::test]
async fn set_variable_rejects_bad_names_and_unknown_elements() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let mut builder = GraphBuilder::default();
    builder.add("a", FnLogic::returning("source", json!(1)).element())?;
    let ids = builder.commit(&h.orchestrator).await?;

    h.orchestrator.set_variable(ids[0], "note", json!("kept")).await?;
    let element = h.orchestrator.element(ids[0]).ok_or("a not live")?;
    assert_eq!(element.variable("note"), Some(&json!("kept")));

    assert!(matches!(
        h.orchestrator.set_variable(ids[0], "bad|name", json!(1)).await,
        Err(DagwheelError::InvalidName(_))
    ));
    assert!(matches!(
        h.orchestrator
            .set_variable(dagwheel::element::ElementId::new(), "note", json!(1))
            .await,
        Err(DagwheelError::ElementNotFound(_))
    ));
    Ok(())
}
