//! Benchmarks: resize propagation through deep trees and separator drags.
//!
//! Run with: cargo bench --package berth-layout

use berth_core::{Location, PanelHandle, PanelId, Point, Rect};
use berth_layout::{MultiSplitter, SeparatorId};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ── Tree generators ──

/// Alternating splits: each new panel goes right of, then below, the last.
fn gen_spiral(panels: u64) -> MultiSplitter {
    let mut layout = MultiSplitter::default();
    layout.set_geometry(Rect::new(0, 0, 2560, 1440));
    layout
        .insert(PanelHandle::new(1), None, Location::Left)
        .expect("first panel");
    for id in 2..=panels {
        let location = if id % 2 == 0 {
            Location::Right
        } else {
            Location::Bottom
        };
        layout
            .insert(PanelHandle::new(id), Some(id - 1), location)
            .expect("insert panel");
    }
    layout
}

/// One flat row of panels.
fn gen_row(panels: u64) -> MultiSplitter {
    let mut layout = MultiSplitter::default();
    layout.set_geometry(Rect::new(0, 0, 2560, 1440));
    for id in 1..=panels {
        layout
            .insert(PanelHandle::new(id), None, Location::Right)
            .expect("insert panel");
    }
    layout
}

// ── Resize propagation ──

fn bench_set_geometry(c: &mut Criterion) {
    let counts: &[u64] = &[4, 16, 64];
    let generators: &[(&str, fn(u64) -> MultiSplitter)] = &[("spiral", gen_spiral), ("row", gen_row)];

    for &(gen_name, gen_fn) in generators {
        let mut group = c.benchmark_group(format!("set_geometry/{}", gen_name));
        for &count in counts {
            group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
                let mut layout = gen_fn(count);
                let mut width = 2560;
                b.iter(|| {
                    // Alternate sizes so every pass does real work.
                    width = if width == 2560 { 1920 } else { 2560 };
                    black_box(layout.set_geometry(Rect::new(0, 0, width, 1440)).len());
                });
            });
        }
        group.finish();
    }
}

// ── Separator drags ──

fn bench_separator_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("separator_drag");

    group.bench_function("root/64", |b| {
        let mut layout = gen_spiral(64);
        let id = SeparatorId {
            container: vec![],
            index: 0,
        };
        let mut delta = 10;
        b.iter(|| {
            delta = -delta;
            black_box(layout.move_separator(&id, delta).expect("separator exists"));
        });
    });

    group.bench_function("hit_test/64", |b| {
        let layout = gen_spiral(64);
        let points: Vec<(i32, i32)> = (0..64).map(|i| (i * 40, i * 22)).collect();
        b.iter(|| {
            for &(x, y) in &points {
                black_box(layout.separator_at(Point::new(x, y)));
            }
        });
    });

    group.finish();
}

fn bench_panel_lookup(c: &mut Criterion) {
    let layout = gen_spiral(64);
    let ids: Vec<PanelId> = (1..=64).collect();
    c.bench_function("item_for_panel/64", |b| {
        b.iter(|| {
            for id in &ids {
                black_box(layout.item_for_panel(*id));
            }
        });
    });
}

criterion_group!(benches, bench_set_geometry, bench_separator_drag, bench_panel_lookup);
criterion_main!(benches);
