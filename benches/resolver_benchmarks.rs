//! Resolver Benchmarks
//!
//! Color resolution runs on every transition against the machine's full live
//! set, so its cost grows with queue depth.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uuid::Uuid;

use floor_core::models::{Machine, WorkOrder, WorkOrderStatus};
use floor_core::resolve_color;

fn queued_orders(machine: &Machine, depth: usize) -> Vec<WorkOrder> {
    (0..depth)
        .map(|n| WorkOrder {
            id: Uuid::new_v4(),
            machine_id: machine.id,
            machine_code: machine.code.clone(),
            lot_id: None,
            status: if n + 1 == depth {
                WorkOrderStatus::EmProducao
            } else {
                WorkOrderStatus::Pendente
            },
            client: "bench".to_string(),
            article: "fio".to_string(),
            yarn_color: "cru".to_string(),
            quantity: 1,
            notes: String::new(),
            created_by: "bench".to_string(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            release_note: String::new(),
            final_report: String::new(),
        })
        .collect()
}

fn benchmark_resolve_color(c: &mut Criterion) {
    let machine = Machine::new("CD1", "16_fusos", Utc::now());
    let mut group = c.benchmark_group("resolve_color");

    for depth in [0usize, 4, 64, 512] {
        let orders = queued_orders(&machine, depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &orders, |b, orders| {
            b.iter(|| resolve_color(black_box(&machine), black_box(orders), &[]))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_resolve_color);
criterion_main!(benches);
