use std::num::NonZeroU64;

use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use dalarray::hyperslab::{plan, Hyperslab};

fn hyperslab_plan(c: &mut Criterion) {
    let chunk_shape = [NonZeroU64::new(1024).unwrap(), NonZeroU64::new(64).unwrap()];
    let max_shape = [None, Some(4096)];
    let mut group = c.benchmark_group("hyperslab_plan");
    for start in [0u64, 1 << 10, 1 << 20] {
        let hyperslab = Hyperslab::new(vec![start, 0], vec![1024, 64])
            .with_stride(vec![2048, 128])
            .with_count(vec![4, 8]);
        group.bench_function(BenchmarkId::new("plan", start), |b| {
            b.iter(|| plan(&[1 << 12, 1024], &max_shape, &chunk_shape, &hyperslab).unwrap());
        });
    }
    group.finish();
}

fn hyperslab_contiguous_runs(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("hyperslab_contiguous_runs");
    group.plot_config(plot_config);
    for size in [8u64, 32, 128] {
        let hyperslab = Hyperslab::new(vec![0, 0, 0], vec![size, size, size / 2])
            .with_stride(vec![1, 1, size])
            .with_count(vec![1, 1, 2]);
        group.throughput(Throughput::Elements(hyperslab.num_elements()));
        group.bench_function(BenchmarkId::new("iter", size * size * size), |b| {
            b.iter(|| hyperslab.iter_contiguous_runs().count());
        });
    }
    group.finish();
}

criterion_group!(benches, hyperslab_plan, hyperslab_contiguous_runs);
criterion_main!(benches);
