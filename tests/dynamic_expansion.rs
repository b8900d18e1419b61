// tests/dynamic_expansion.rs

mod common;
use crate::common::harness::Harness;
use crate::common::init_tracing;
use crate::common::logic::{FnLogic, Seen, seen};

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use dagwheel::element::{DYNAMIC_ATTRIBUTE, ElementId, ElementProvider, Outcome, Status};
use dagwheel::graph::GraphBuilder;
use serde_json::json;

type TestResult = Result<(), Box<dyn Error>>;

type Spawned = Arc<Mutex<BTreeMap<String, ElementId>>>;

/// Finishes with 7 and spawns `p` and `q`, plus `r` reading `q` when
/// `chained` is set.
fn expander(spawned: Spawned, observed: Seen, chained: bool) -> FnLogic {
    FnLogic::new("expander", move |_| {
        let mut builder = GraphBuilder::default();
        builder
            .add("p", FnLogic::capturing("child", json!("p"), observed.clone()).element())?
            .add("q", FnLogic::capturing("child", json!("q"), observed.clone()).element())?;
        if chained {
            builder
                .add("r", FnLogic::capturing("child", json!("r"), observed.clone()).element())?
                .connect("r", "from_q", "q")?;
        }

        let mut ids = spawned.lock().unwrap();
        for name in builder.names() {
            if let Some(id) = builder.element_id(name) {
                ids.insert(name.to_string(), id);
            }
        }
        Ok(Outcome::expand(json!(7), builder))
    })
}

#[tokio::test]
async fn spawned_elements_start_ready_with_a_delivered_edge() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let spawned: Spawned = Arc::default();
    let observed = seen();

    let mut builder = GraphBuilder::default();
    builder.add("e", expander(spawned.clone(), observed.clone(), false).element())?;
    let ids = builder.commit(&h.orchestrator).await?;
    let e = ids[0];

    h.orchestrator.tick().await;
    assert_eq!(h.orchestrator.status_of(e), Some(Status::NotifyFinish));

    let children = spawned.lock().unwrap().clone();
    assert_eq!(children.len(), 2);
    let completing = h.orchestrator.element(e).ok_or("expander not live")?;
    for id in children.values() {
        let child = h.orchestrator.element(*id).ok_or("child not live")?;
        assert_eq!(child.status(), Status::Ready);
        assert_eq!(child.in_edges(), &BTreeMap::from([(e, true)]));
        assert_eq!(child.attributes().get(DYNAMIC_ATTRIBUTE), Some(&e));
        assert_eq!(completing.out_edges().get(id), Some(&false));
    }

    h.orchestrator.tick().await;
    let runs = observed.lock().unwrap().clone();
    assert_eq!(runs.len(), 2);
    assert!(
        runs.iter()
            .all(|inputs| inputs.get(DYNAMIC_ATTRIBUTE) == Some(&json!(7)))
    );
    Ok(())
}

#[tokio::test]
async fn completing_element_outlives_the_elements_it_spawned() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let spawned: Spawned = Arc::default();

    let mut builder = GraphBuilder::default();
    builder.add("e", expander(spawned.clone(), seen(), false).element())?;
    let ids = builder.commit(&h.orchestrator).await?;
    let e = ids[0];
    h.orchestrator.tick().await;
    let children: Vec<ElementId> = spawned.lock().unwrap().values().copied().collect();

    for _ in 0..40 {
        if h.orchestrator.is_idle() {
            break;
        }
        if h.orchestrator.status_of(e) == Some(Status::Destroyable) {
            for child in &children {
                assert!(
                    matches!(
                        h.orchestrator.status_of(*child),
                        Some(Status::NotifiedInput) | Some(Status::Destroyable) | None
                    ),
                    "expander became destroyable before a child acknowledged"
                );
            }
        }
        h.orchestrator.tick().await;
    }
    assert!(h.orchestrator.is_idle());
    assert!(h.handler.errors().is_empty(), "{:?}", h.handler.errors());
    Ok(())
}

#[tokio::test]
async fn only_start_nodes_of_the_expansion_are_gated() -> TestResult {
    init_tracing();
    let h = Harness::new(ElementProvider::new());
    let spawned: Spawned = Arc::default();
    let observed = seen();

    let mut builder = GraphBuilder::default();
    builder.add("e", expander(spawned.clone(), observed.clone(), true).element())?;
    let ids = builder.commit(&h.orchestrator).await?;
    let e = ids[0];
    h.orchestrator.tick().await;

    let children = spawned.lock().unwrap().clone();
    let q = children["q"];
    let r = children["r"];

    let chained = h.orchestrator.element(r).ok_or("r not live")?;
    assert_eq!(chained.status(), Status::Pending);
    assert_eq!(chained.in_edges(), &BTreeMap::from([(q, false)]));

    let completing = h.orchestrator.element(e).ok_or("expander not live")?;
    assert_eq!(completing.out_edges().len(), 2);
    assert!(!completing.out_edges().contains_key(&r));

    assert!(h.drain(60).await.is_some());
    let runs = observed.lock().unwrap().clone();
    assert_eq!(runs.len(), 3);
    assert!(runs.contains(&BTreeMap::from([("from_q".to_string(), json!("q"))])));
    Ok(())
}
