//! Performance benchmarks for the render pass.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neuroscope::{
    render, topology, BitmapSurface, CanvasSize, Frame, Hyperparameters, Layout, ModelFamily,
    Palette, WeightMap,
};
use rand::SeedableRng;

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_plan");

    for hidden in [8, 32, 128] {
        let hp = Hyperparameters::default().with_hidden_units(hidden);
        let widths = topology::derive(ModelFamily::FullyConnected, &hp).unwrap();
        let layout = Layout::for_canvas(&widths, CanvasSize::default());

        group.bench_with_input(BenchmarkId::from_parameter(hidden), &layout, |b, layout| {
            b.iter(|| Frame::plan(black_box(layout), |_| 0.5));
        });
    }
    group.finish();
}

fn bench_render_bitmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_bitmap");
    group.sample_size(20);

    for family in [ModelFamily::FullyConnected, ModelFamily::Recurrent] {
        let widths = topology::derive(family, &Hyperparameters::default()).unwrap();
        let layout = Layout::for_canvas(&widths, CanvasSize::default());
        let mut surface = BitmapSurface::new(CanvasSize::default()).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let weights = WeightMap::new();

        group.bench_function(BenchmarkId::from_parameter(family), |b| {
            b.iter(|| {
                render(
                    &mut surface,
                    black_box(&layout),
                    &weights,
                    &Palette::default(),
                    &mut rng,
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan, bench_render_bitmap);
criterion_main!(benches);
