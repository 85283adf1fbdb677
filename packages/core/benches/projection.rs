//! Performance benchmarks for OrgChart hierarchy reads
//!
//! Run with: `cargo bench -p orgchart-core`
//!
//! These benchmarks measure critical path performance:
//! - Tree projection of wide and deep organizations
//! - Whole-organization read through the service on both backends

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orgchart_core::db::{DatabaseService, InMemoryStore, NodeStore, TursoStore};
use orgchart_core::models::OrgNode;
use orgchart_core::services::{project_forest, HierarchyService};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Balanced organization where every manager has `fan_out` reports
fn generate_org(size: usize, fan_out: usize) -> Vec<OrgNode> {
    let mut nodes: Vec<OrgNode> = Vec::with_capacity(size);
    nodes.push(OrgNode::new("Root", "ROLE_0", "", None));
    for i in 1..size {
        let parent_id = nodes[(i - 1) / fan_out].id.clone();
        nodes.push(OrgNode::new(
            format!("Person {}", i),
            format!("ROLE_{}", i),
            "",
            Some(parent_id),
        ));
    }
    nodes
}

/// Benchmark flat-to-nested projection
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_forest");

    for (label, size, fan_out) in [("wide", 5_000, 50), ("balanced", 5_000, 4), ("chain", 1_000, 1)] {
        let nodes = generate_org(size, fan_out);
        group.bench_with_input(BenchmarkId::new(label, size), &nodes, |b, nodes| {
            b.iter(|| black_box(project_forest(nodes).unwrap()));
        });
    }

    group.finish();
}

/// Setup a store seeded with a 1000-node organization
async fn seeded(store: Arc<dyn NodeStore>) -> HierarchyService {
    store.create_many(generate_org(1_000, 8)).await.unwrap();
    HierarchyService::new(store)
}

/// Benchmark list_organization end to end
fn bench_list_organization(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("list_organization");
    group.sample_size(20);

    let memory = rt.block_on(seeded(Arc::new(InMemoryStore::new())));
    group.bench_function("memory_1000", |b| {
        b.iter(|| black_box(rt.block_on(memory.list_organization()).unwrap()));
    });

    let temp_dir = TempDir::new().unwrap();
    let libsql = rt.block_on(async {
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("bench.db"))
                .await
                .unwrap(),
        );
        seeded(Arc::new(TursoStore::new(db))).await
    });
    group.bench_function("libsql_1000", |b| {
        b.iter(|| black_box(rt.block_on(libsql.list_organization()).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_projection, bench_list_organization);
criterion_main!(benches);
