//! Criterion micro-benchmarks for fetch, invalidation and observer dispatch.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_bench::{reference_fields, ReductionObserver};
use tessera_core::{DatasetId, StepId};
use tessera_registry::DataRegistry;

const DATASETS: usize = 16;
const OBSERVERS: usize = 64;

fn bench_fetch_valid(c: &mut Criterion) {
    let mut fields = reference_fields(1);
    let mut registry = DataRegistry::new();
    registry
        .register_dataset(DatasetId(0), &mut fields[0])
        .unwrap();

    c.bench_function("fetch_valid", |b| {
        b.iter(|| {
            let f = registry
                .fetch::<tessera_bench::ReferenceField>(DatasetId(0), false)
                .unwrap();
            black_box(f.host[0]);
            registry.release(DatasetId(0)).unwrap();
        });
    });
}

fn bench_invalidate_and_resync(c: &mut Criterion) {
    let mut fields = reference_fields(DATASETS);
    let mut registry = DataRegistry::new();
    for (i, field) in fields.iter_mut().enumerate() {
        registry.register_dataset(DatasetId(i as u32), field).unwrap();
    }

    c.bench_function("invalidate_all_resync_16x10k", |b| {
        b.iter(|| {
            registry.invalidate_all();
            for i in 0..DATASETS as u32 {
                let f = registry
                    .fetch::<tessera_bench::ReferenceField>(DatasetId(i), false)
                    .unwrap();
                black_box(f.host[0]);
            }
        });
    });
}

fn bench_dispatch_gated(c: &mut Criterion) {
    let mut fields = reference_fields(1);
    let mut observers: Vec<ReductionObserver> = (0..OBSERVERS)
        .map(|_| ReductionObserver::new(DatasetId(0)))
        .collect();
    let mut registry = DataRegistry::new();
    registry
        .register_dataset(DatasetId(0), &mut fields[0])
        .unwrap();
    for (i, observer) in observers.iter_mut().enumerate() {
        registry.register_observer(observer, (i % 8) as u32 + 1);
    }

    let mut step = 0u64;
    c.bench_function("dispatch_64_observers", |b| {
        b.iter(|| {
            registry.dispatch_notifications(StepId(step)).unwrap();
            step += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_fetch_valid,
    bench_invalidate_and_resync,
    bench_dispatch_gated
);
criterion_main!(benches);
