// tests/property_drain.rs

mod common;
use crate::common::harness::Harness;
use crate::common::logic::{FnLogic, Seen, seen};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dagwheel::element::ElementProvider;
use dagwheel::graph::GraphBuilder;
use dagwheel::store::MemoryStore;
use proptest::prelude::*;
use serde_json::json;

// Node i may only depend on nodes 0..i, which keeps the graph acyclic.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_nodes).prop_flat_map(|nodes| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), nodes).prop_map(
            |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            picks.into_iter().map(|p| p % i).collect()
                        }
                    })
                    .collect()
            },
        )
    })
}

fn node_name(i: usize) -> String {
    format!("node_{i}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_dags_drain_completely(deps in dag_strategy(8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let store = MemoryStore::new();
            let h = Harness::on_store(Arc::new(store.clone()), ElementProvider::new());

            let mut builder = GraphBuilder::default();
            let mut observed: Vec<(FnLogic, Seen)> = Vec::new();
            for i in 0..deps.len() {
                let inputs = seen();
                let logic = FnLogic::capturing("node", json!(i), inputs.clone());
                builder.add(&node_name(i), logic.element()).unwrap();
                observed.push((logic, inputs));
            }
            for (i, producers) in deps.iter().enumerate() {
                for j in producers {
                    builder
                        .connect(&node_name(i), &format!("in{j}"), &node_name(*j))
                        .unwrap();
                }
            }
            builder.commit(&h.orchestrator).await.unwrap();

            prop_assert!(h.drain(200).await.is_some());
            prop_assert!(h.orchestrator.is_idle());
            prop_assert!(store.is_empty());
            prop_assert!(store.wheel().is_empty());
            prop_assert!(h.handler.errors().is_empty());

            for (i, (logic, inputs)) in observed.iter().enumerate() {
                prop_assert_eq!(logic.calls(), 1);
                let expected: BTreeMap<String, serde_json::Value> = deps[i]
                    .iter()
                    .map(|j| (format!("in{j}"), json!(j)))
                    .collect();
                prop_assert_eq!(inputs.lock().unwrap().clone(), vec![expected]);
            }
            Ok(())
        })?;
    }
}
