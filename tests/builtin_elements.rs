// tests/builtin_elements.rs

mod common;
use crate::common::harness::Harness;
use crate::common::init_tracing;

use std::error::Error;

use dagwheel::demo_workflow;
use dagwheel::element::Status;
use dagwheel::elements::{Constant, Countdown, Sum, builtin_provider};
use dagwheel::graph::GraphBuilder;
use serde_json::json;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn demo_workflow_adds_up_to_seven() -> TestResult {
    init_tracing();
    let h = Harness::new(builtin_provider());
    let builder = demo_workflow()?;
    let total = builder.element_id("total").ok_or("missing total")?;
    let polls = builder.element_id("polls").ok_or("missing polls")?;
    builder.commit(&h.orchestrator).await?;

    let summed = h
        .tick_until(100, |o| o.value_of(total) == Some(json!(7)))
        .await;
    assert!(summed, "total never reached 7");
    assert_eq!(h.orchestrator.status_of(polls), Some(Status::NotifiedInput));

    assert!(h.drain(100).await.is_some());
    assert!(h.handler.errors().is_empty(), "unexpected errors: {:?}", h.handler.errors());
    Ok(())
}

#[tokio::test]
async fn countdown_recalls_until_exhausted() -> TestResult {
    init_tracing();
    let h = Harness::new(builtin_provider());
    let mut builder = GraphBuilder::default();
    builder.add("polls", Countdown::element(3)?)?;
    let polls = builder.element_id("polls").ok_or("missing polls")?;
    builder.commit(&h.orchestrator).await?;

    let done = h
        .tick_until(100, |o| o.status_of(polls) == Some(Status::NotifyFinish))
        .await;
    assert!(done);
    assert_eq!(h.orchestrator.value_of(polls), Some(json!(3)));
    assert_eq!(h.executor.executed(), 4);
    Ok(())
}

#[tokio::test]
async fn sum_mixes_integers_and_floats() -> TestResult {
    init_tracing();
    let h = Harness::new(builtin_provider());
    let mut builder = GraphBuilder::default();
    builder
        .add("i", Constant::element(2)?)?
        .add("f", Constant::element(0.5)?)?
        .add("total", Sum::element())?
        .connect("total", "a", "i")?
        .connect("total", "b", "f")?;
    let total = builder.element_id("total").ok_or("missing total")?;
    builder.commit(&h.orchestrator).await?;

    let done = h.tick_until(20, |o| o.value_of(total).is_some()).await;
    assert!(done);
    assert_eq!(h.orchestrator.value_of(total), Some(json!(2.5)));
    Ok(())
}

#[tokio::test]
async fn sum_rejects_non_numeric_inputs() -> TestResult {
    init_tracing();
    let h = Harness::new(builtin_provider());
    let mut builder = GraphBuilder::default();
    builder
        .add("word", Constant::element("seven")?)?
        .add("total", Sum::element())?
        .connect("total", "a", "word")?;
    let total = builder.element_id("total").ok_or("missing total")?;
    builder.commit(&h.orchestrator).await?;

    h.ticks(10).await;
    assert_eq!(h.orchestrator.status_of(total), Some(Status::Running));
    assert!(h.handler.contains("input 'a' is not a number"));
    Ok(())
}
