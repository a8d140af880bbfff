use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ieeg_retriever::{assemble, plan_chunks, ServiceLimits, SplitAxis, TimeRange};
use ndarray::Array2;

pub fn bench_time_planning(c: &mut Criterion) {
    // Ten hours of recording split into one-minute clips.
    let range = TimeRange::new(0, 36_000_000_000).unwrap();
    let ids: Vec<usize> = (0..90).collect();
    let limits = ServiceLimits::default();

    c.bench_function("plan_time_split_10h", |b| {
        b.iter(|| {
            let plan = plan_chunks(black_box(range), black_box(&ids), &limits).unwrap();
            black_box(plan.num_chunks())
        });
    });
}

pub fn bench_channel_planning(c: &mut Criterion) {
    let range = TimeRange::new(0, 100_000_000).unwrap();
    let ids: Vec<usize> = (0..600).collect();
    let limits = ServiceLimits::default();

    c.bench_function("plan_channel_split_600ch", |b| {
        b.iter(|| {
            let plan = plan_chunks(black_box(range), black_box(&ids), &limits).unwrap();
            black_box(plan.num_chunks())
        });
    });
}

pub fn bench_assembly(c: &mut Criterion) {
    // Thirty one-minute chunks of a 20-channel recording at 500 Hz.
    let blocks: Vec<Array2<f64>> = (0..30)
        .map(|i| Array2::from_elem((30_000, 20), i as f64))
        .collect();

    c.bench_function("assemble_30_time_chunks", |b| {
        b.iter(|| {
            let combined = assemble(black_box(&blocks), SplitAxis::Time).unwrap();
            black_box(combined.nrows())
        });
    });
}

criterion_group!(benches, bench_time_planning, bench_channel_planning, bench_assembly);
criterion_main!(benches);
