//! Criterion benchmarks for the software backend.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use trigon::raster::SoftwareGl;
use trigon::scene::Scene;

/// Steady-state redraw (clear + rasterize; the pipeline is built on the
/// first iteration) at several canvas sizes.
fn bench_draw_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_size");

    for &(w, h) in [(300u32, 150u32), (640, 480), (1280, 720)].iter() {
        group.throughput(Throughput::Elements(w as u64 * h as u64));
        group.bench_with_input(
            BenchmarkId::new("software", format!("{w}x{h}")),
            &(w, h),
            |b, &(w, h)| {
                let scene = Scene::new(SoftwareGl::new(w, h));
                b.iter(|| {
                    scene.draw().unwrap();
                    black_box(scene.backend().draw_calls())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_draw_sizes);
criterion_main!(benches);
