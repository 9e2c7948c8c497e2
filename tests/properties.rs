//! Property tests over random layered provenance DAGs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use proptest::prelude::*;
use provenance_kernel::{
    ActionId, ActionKind, ActionRecord, ArtifactId, ArtifactRef, BuilderConfig, InMemoryResolver,
    ProvenanceBuilder, ProvenanceGraph,
};
use uuid::Uuid;

fn artifact(n: usize) -> ArtifactId {
    ArtifactId::new(Uuid::from_u128(n as u128 + 1))
}

fn action(n: usize) -> ActionId {
    ActionId::new(Uuid::from_u128(0xA000 + n as u128))
}

/// One generated node: a kind selector and raw input picks.
type NodeSpec = (u8, Vec<usize>);

/// Node `i` may only consume nodes with a larger index, so the graph is
/// acyclic. Kind 0 leaves the node without a record (except the root),
/// 1 makes it an import, 2 a method over single inputs, 3 a method over a
/// keyed collection.
fn resolver_for(specs: &[NodeSpec]) -> InMemoryResolver {
    let mut resolver = InMemoryResolver::new();
    let n = specs.len();

    for (i, (kind, picks)) in specs.iter().enumerate() {
        let inputs: Vec<usize> = if i + 1 < n {
            let mut seen = BTreeSet::new();
            picks
                .iter()
                .map(|p| i + 1 + p % (n - i - 1))
                .filter(|j| seen.insert(*j))
                .collect()
        } else {
            Vec::new()
        };

        match (kind % 4, i) {
            (0, 0) | (1, _) => resolver.add_import(artifact(i), action(i)),
            (0, _) => {}
            (2, _) => {
                let record = inputs.iter().enumerate().fold(
                    ActionRecord::new(action(i), ActionKind::Method),
                    |record, (slot, j)| record.with_input(format!("in{slot}"), ArtifactRef::Single(artifact(*j))),
                );
                resolver.add_record(artifact(i), record);
            }
            _ => {
                let elements = inputs.iter().map(|j| (format!("k{j}"), artifact(*j))).collect();
                resolver.add_record(
                    artifact(i),
                    ActionRecord::new(action(i), ActionKind::Method).with_input("items", ArtifactRef::Collection(elements)),
                );
            }
        }
    }

    resolver
}

fn build(resolver: Arc<InMemoryResolver>, fanout: usize) -> ProvenanceGraph {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime
        .block_on(
            ProvenanceBuilder::new(resolver, BuilderConfig::default().with_max_fanout(fanout))
                .build_graph(artifact(0)),
        )
        .unwrap()
}

fn dag_specs() -> impl Strategy<Value = Vec<NodeSpec>> {
    prop::collection::vec((0u8..4, prop::collection::vec(0usize..64, 0..4)), 1..25)
}

proptest! {
    #[test]
    fn prop_unknown_provenance_has_depth_zero(specs in dag_specs()) {
        let graph = build(Arc::new(resolver_for(&specs)), 16);
        for (artifact, action) in &graph.maps().artifact_to_action {
            if action.is_none() {
                prop_assert_eq!(graph.depth(artifact), Some(0));
            }
        }
    }

    #[test]
    fn prop_depth_recurrence(specs in dag_specs()) {
        let graph = build(Arc::new(resolver_for(&specs)), 16);
        let maps = graph.maps();

        for artifact in maps.artifact_to_action.keys() {
            let edges = maps.action_of(artifact).map(|a| maps.inputs_of(&a)).unwrap_or_default();
            let expected = edges
                .iter()
                .map(|e| graph.depth(&e.source).unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            prop_assert_eq!(graph.depth(artifact), Some(expected));
        }
    }

    #[test]
    fn prop_height_is_root_depth_and_max_row(specs in dag_specs()) {
        let graph = build(Arc::new(resolver_for(&specs)), 16);
        prop_assert_eq!(graph.depth(&artifact(0)), Some(graph.height()));
        prop_assert_eq!(graph.model().max_row(), Some(graph.height()));
    }

    #[test]
    fn prop_each_artifact_resolved_once(specs in dag_specs()) {
        let resolver = Arc::new(resolver_for(&specs));
        let graph = build(Arc::clone(&resolver), 16);

        prop_assert_eq!(resolver.total_calls(), graph.maps().artifact_to_action.len());
        for artifact in graph.maps().artifact_to_action.keys() {
            prop_assert_eq!(resolver.calls_for(artifact), 1);
        }
    }

    #[test]
    fn prop_columns_are_dense_per_row(specs in dag_specs()) {
        let graph = build(Arc::new(resolver_for(&specs)), 16);

        let mut rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (row, col) in graph.model().nodes().filter_map(|n| n.position()) {
            rows.entry(row).or_default().push(col);
        }
        for cols in rows.values() {
            let expected: Vec<usize> = (0..cols.len()).collect();
            prop_assert_eq!(cols, &expected);
        }
    }

    #[test]
    fn prop_edges_connect_emitted_nodes(specs in dag_specs()) {
        let graph = build(Arc::new(resolver_for(&specs)), 16);
        let model = graph.model();
        let ids: BTreeSet<String> = model.nodes().map(|n| n.id()).collect();

        for edge in model.edges() {
            prop_assert!(ids.contains(&edge.source), "dangling source {}", edge.source);
            prop_assert!(ids.contains(&edge.target.to_string()), "dangling target {}", edge.target);
        }
        for node in model.nodes() {
            if let Some(parent) = node.parent_action() {
                prop_assert!(ids.contains(&parent.to_string()));
            }
        }
    }

    #[test]
    fn prop_fanout_does_not_change_model(specs in dag_specs()) {
        let resolver = Arc::new(resolver_for(&specs));
        let serial = build(Arc::clone(&resolver), 1);
        let wide = build(resolver, 16);

        prop_assert_eq!(serial.model(), wide.model());
        prop_assert_eq!(serial.fingerprint().unwrap(), wide.fingerprint().unwrap());
    }
}
