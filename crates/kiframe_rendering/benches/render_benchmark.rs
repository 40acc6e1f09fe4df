//! # Render Benchmark
//!
//! Measures `render` + `refresh` against the recording surface for frames
//! of increasing size. Primitive creation is outside the measured loop.
//!
//! Run with: `cargo bench --package kiframe_rendering`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kiframe_rendering::{FrameRenderer, RecordingSurface};
use kiframe_shared::{Entity, EntityCategory, Frame, HudState, KiframeConfig, Point, WallSegment};

#[allow(clippy::cast_precision_loss)]
fn scene(walls: usize, entities: usize, projectiles: usize) -> Frame {
    Frame {
        sequence: Some(1),
        walls: (0..walls)
            .map(|i| {
                let x = (i * 4) as f64;
                WallSegment::Quad {
                    x1: x,
                    y_top1: 40.0,
                    y_bottom1: 160.0,
                    x2: x + 4.0,
                    y_top2: 42.0,
                    y_bottom2: 158.0,
                    distance: (i * 3) as f64,
                    silhouette: if i % 7 == 0 { 0 } else { 3 },
                }
            })
            .collect(),
        entities: (0..entities)
            .map(|i| {
                Entity::wireframe(
                    (i * 30) as f64,
                    80.0,
                    130.0,
                    25.0,
                    EntityCategory::from_code([0, 33, 68][i % 3]),
                    64.0,
                )
            })
            .collect(),
        projectiles: (0..projectiles)
            .map(|i| Point::new((i * 5) as f64, 100.0))
            .collect(),
        hud: Some(HudState {
            health: Some(100),
            ammo: Some(50),
            armor: Some(25),
            keys: vec!["red".into()],
            lines: Vec::new(),
        }),
    }
}

/// Benchmark: small, typical and full-capacity frames.
fn bench_render(c: &mut Criterion) {
    let config = KiframeConfig::default();
    let mut group = c.benchmark_group("render_frame");

    for (walls, entities, projectiles) in [(10, 2, 0), (40, 5, 10), (70, 10, 50)] {
        let frame = scene(walls, entities, projectiles);
        let mut renderer = FrameRenderer::new(RecordingSurface::new(), &config);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{walls}w_{entities}e_{projectiles}p")),
            &frame,
            |b, frame| {
                b.iter(|| {
                    let report = renderer.render(black_box(frame));
                    renderer.refresh();
                    black_box(report)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: a frame that overflows the line pool every time.
fn bench_truncation(c: &mut Criterion) {
    let config = KiframeConfig::default();
    let frame = scene(200, 10, 0);
    let mut renderer = FrameRenderer::new(RecordingSurface::new(), &config);

    c.bench_function("render_truncated_frame", |b| {
        b.iter(|| black_box(renderer.render(black_box(&frame))));
    });
}

criterion_group!(benches, bench_render, bench_truncation);
criterion_main!(benches);
