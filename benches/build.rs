//! Performance benchmarks for provenance graph builds.
//!
//! Run with: `cargo bench --bench build`
//!
//! ## Scenarios
//!
//! | Benchmark | Shape | Notes |
//! |-----------|-------|-------|
//! | `diamond` | root ← N methods ← one shared import | Memo hits on the shared ancestor |
//! | `layered` | L layers of W artifacts, each consuming the whole next layer | Dense edges |
//! | `collections` | root ← N collections of K elements | Grouping and hiding |
//! | `assemble` | Grouping, depth, layout and emission only | No resolver |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use provenance_kernel::{
    ActionId, ActionKind, ActionRecord, ArtifactId, ArtifactRef, BuilderConfig, InMemoryResolver,
    ProvenanceBuilder, ProvenanceGraph,
};
use uuid::Uuid;

fn artifact(n: u128) -> ArtifactId {
    ArtifactId::new(Uuid::from_u128(n))
}

fn action(n: u128) -> ActionId {
    ActionId::new(Uuid::from_u128(0xA000_0000 + n))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Root consuming `width` branches that all descend from one import.
fn diamond(width: u128) -> InMemoryResolver {
    let mut resolver = InMemoryResolver::new();
    let branches: Vec<ArtifactId> = (0..width).map(|i| artifact(1_000 + i)).collect();
    resolver.add_record(
        artifact(1),
        ActionRecord::new(action(1), ActionKind::Method).with_input("branches", ArtifactRef::List(branches.clone())),
    );
    for (i, branch) in branches.iter().enumerate() {
        resolver.add_record(
            *branch,
            ActionRecord::new(action(1_000 + i as u128), ActionKind::Method)
                .with_input("raw", ArtifactRef::Single(artifact(2))),
        );
    }
    resolver.add_import(artifact(2), action(2));
    resolver
}

/// `layers` layers of `width` artifacts; every artifact consumes the whole
/// next layer, the last layer is imported.
fn layered(layers: u128, width: u128) -> InMemoryResolver {
    let mut resolver = InMemoryResolver::new();
    let id = |layer: u128, i: u128| 10_000 * (layer + 1) + i;

    resolver.add_record(
        artifact(1),
        ActionRecord::new(action(1), ActionKind::Method)
            .with_input("layer", ArtifactRef::List((0..width).map(|i| artifact(id(0, i))).collect())),
    );
    for layer in 0..layers {
        for i in 0..width {
            let n = id(layer, i);
            if layer + 1 == layers {
                resolver.add_import(artifact(n), action(n));
            } else {
                let next = (0..width).map(|j| artifact(id(layer + 1, j))).collect();
                resolver.add_record(
                    artifact(n),
                    ActionRecord::new(action(n), ActionKind::Method).with_input("layer", ArtifactRef::List(next)),
                );
            }
        }
    }
    resolver
}

/// Root consuming `count` keyed collections of `size` imported elements.
fn collections(count: u128, size: u128) -> InMemoryResolver {
    let mut resolver = InMemoryResolver::new();
    let mut root = ActionRecord::new(action(1), ActionKind::Pipeline);
    for c in 0..count {
        let elements: Vec<(String, ArtifactId)> = (0..size)
            .map(|k| (format!("sample-{k}"), artifact(100_000 + c * 1_000 + k)))
            .collect();
        for (_, element) in &elements {
            resolver.add_import(*element, action(100 + c));
        }
        root = root.with_input(format!("collection_{c}"), ArtifactRef::Collection(elements));
    }
    resolver.add_record(artifact(1), root);
    resolver
}

fn build(rt: &tokio::runtime::Runtime, resolver: &Arc<InMemoryResolver>) -> ProvenanceGraph {
    let builder = ProvenanceBuilder::new(Arc::clone(resolver), BuilderConfig::default());
    rt.block_on(builder.build_graph(artifact(1))).unwrap()
}

/// Benchmark builds of wide diamonds.
fn bench_diamond(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("diamond");

    for width in [10u128, 100, 500] {
        let resolver = Arc::new(diamond(width));

        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("width", width), &resolver, |b, resolver| {
            b.iter(|| {
                let graph = build(&rt, black_box(resolver));
                assert_eq!(graph.height(), 2);
                graph
            })
        });
    }

    group.finish();
}

/// Benchmark builds of densely connected layers.
fn bench_layered(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("layered");

    for (layers, width) in [(4u128, 8u128), (8, 16), (16, 16)] {
        let resolver = Arc::new(layered(layers, width));

        group.throughput(Throughput::Elements((layers * width) as u64));
        group.bench_with_input(
            BenchmarkId::new("layers_x_width", format!("{layers}x{width}")),
            &resolver,
            |b, resolver| {
                b.iter(|| {
                    let graph = build(&rt, black_box(resolver));
                    assert_eq!(graph.height(), layers as usize);
                    graph
                })
            },
        );
    }

    group.finish();
}

/// Benchmark builds dominated by collection grouping.
fn bench_collections(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("collections");

    for (count, size) in [(4u128, 16u128), (16, 64)] {
        let resolver = Arc::new(collections(count, size));

        group.throughput(Throughput::Elements((count * size) as u64));
        group.bench_with_input(
            BenchmarkId::new("count_x_size", format!("{count}x{size}")),
            &resolver,
            |b, resolver| {
                b.iter(|| {
                    let graph = build(&rt, black_box(resolver));
                    assert_eq!(graph.grouping().collapsed().count(), count as usize);
                    graph
                })
            },
        );
    }

    group.finish();
}

/// Benchmark assembly of an already traversed graph.
fn bench_assemble(c: &mut Criterion) {
    let rt = runtime();
    let resolver = Arc::new(layered(16, 16));
    let builder = ProvenanceBuilder::with_defaults(resolver);
    let traversal = rt.block_on(builder.traverse(artifact(1))).unwrap();

    c.bench_function("assemble", |b| {
        b.iter(|| ProvenanceGraph::assemble(black_box(traversal.clone())))
    });
}

criterion_group!(benches, bench_diamond, bench_layered, bench_collections, bench_assemble);
criterion_main!(benches);
