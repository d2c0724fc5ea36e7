//! Performance benchmarks for AlignViz graph building
//!
//! Run with: `cargo bench -p alignviz-core`

use alignviz_core::render::render_node_details;
use alignviz_core::{build_graph, HierarchySnapshot, NodeService};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

/// Subcomponent with `capabilities` x `functions` nested records
fn generate_subcomponent(id: &str, capabilities: usize, functions: usize) -> Value {
    let capabilities: Vec<Value> = (0..capabilities)
        .map(|c| {
            let functions: Vec<Value> = (0..functions)
                .map(|f| {
                    json!({
                        "name": format!("Function {}", f),
                        "parameters": [{"name": "input", "type": "tensor"}],
                        "specifications": [{
                            "name": format!("Spec {}", f),
                            "requirements": [{"id": "r1", "description": "Log", "priority": "high"}]
                        }]
                    })
                })
                .collect();
            json!({"name": format!("Capability {}", c), "functions": functions})
        })
        .collect();

    json!({"id": id, "name": id, "capabilities": capabilities})
}

fn generate_snapshot(subcomponents_per_component: usize) -> HierarchySnapshot {
    let mut snapshot = HierarchySnapshot::default();
    let component_ids: Vec<String> = snapshot.components.keys().cloned().collect();
    for component_id in component_ids {
        for s in 0..subcomponents_per_component {
            let id = format!("{}-sub-{}", component_id, s);
            snapshot
                .subcomponents
                .insert(id.clone(), generate_subcomponent(&id, 5, 5));
        }
    }
    snapshot
}

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");

    let small = generate_snapshot(2);
    group.bench_function("8_subcomponents", |b| {
        b.iter(|| black_box(build_graph(black_box(&small))))
    });

    let large = generate_snapshot(25);
    group.sample_size(20); // Fewer samples for the large hierarchy
    group.bench_function("100_subcomponents", |b| {
        b.iter(|| black_box(build_graph(black_box(&large))))
    });

    group.finish();
}

fn bench_load_service(c: &mut Criterion) {
    let snapshot = generate_snapshot(10);

    c.bench_function("load_graph_into_service", |b| {
        b.iter(|| {
            let mut service = NodeService::default();
            black_box(service.load_graph(build_graph(&snapshot)))
        })
    });
}

fn bench_details_lookup(c: &mut Criterion) {
    let snapshot = generate_snapshot(10);
    let target = "value-learning-sub-9-capability-capability-4-function-function-4";

    c.bench_function("find_and_render_details", |b| {
        b.iter(|| {
            let details = snapshot.find_details(black_box(target));
            black_box(details.map(|details| render_node_details(&details)))
        })
    });
}

criterion_group!(
    benches,
    bench_build_graph,
    bench_load_service,
    bench_details_lookup
);
criterion_main!(benches);
