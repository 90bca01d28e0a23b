// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use understory_scene::{GeometryStore, Interactions, PathPrimitive, RectPrimitive, SceneColumns};
use understory_tiles::{SpatialIndex, TileGrid, level_for_scale};
use understory_viewport::{HitContext, HitTester};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_grid_scene(n: usize, cell: f64) -> Arc<SceneColumns> {
    let mut store = GeometryStore::new();
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            store
                .add_rect(RectPrimitive {
                    rect: Rect::new(x0, y0, x0 + cell * 0.8, y0 + cell * 0.8),
                    interactions: Interactions::CLICK | Interactions::HOVER,
                    ..Default::default()
                })
                .unwrap();
        }
    }
    store.flush()
}

fn gen_wire_scene(count: usize, extent: f64) -> Arc<SceneColumns> {
    let mut store = GeometryStore::new();
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for i in 0..count {
        let from = Point::new(rng.next_f64() * extent, rng.next_f64() * extent);
        let to = Point::new(rng.next_f64() * extent, rng.next_f64() * extent);
        store
            .add_path(PathPrimitive {
                from,
                to,
                width: 2.0,
                keep_width: i % 2 == 0,
                ..Default::default()
            })
            .unwrap();
    }
    store.flush()
}

fn bench_level_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_one_scan");
    let columns = gen_grid_scene(128, 8.0);
    group.bench_function("grid_16k", |b| {
        b.iter_batched(
            || SpatialIndex::<()>::new(columns.clone(), 1024),
            |mut index| {
                for i in 0..4 {
                    black_box(index.get_tile(1, i));
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_deep_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_lookup");
    let columns = gen_grid_scene(128, 8.0);
    for level in [3_u8, 5, 7] {
        group.bench_function(format!("grid_16k_level_{level}"), |b| {
            b.iter_batched(
                || SpatialIndex::<()>::new(columns.clone(), 1024),
                |mut index| {
                    let key = index
                        .grid()
                        .key_at(level, Point::new(512.0, 512.0))
                        .unwrap();
                    black_box(index.get_tile_by_key(key));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_visible_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("visible_keys");
    let grid = TileGrid::new(Rect::new(0.0, 0.0, 10_000.0, 10_000.0), 1024);
    for k in [1.0, 20.0, 300.0] {
        let level = level_for_scale(k, 10);
        let span = 10_000.0 / k;
        let view = Rect::new(4000.0, 4000.0, 4000.0 + span, 4000.0 + span);
        group.bench_function(format!("k_{k}"), |b| {
            b.iter(|| black_box(grid.keys_overlapping(level, view)));
        });
    }
    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");
    for (name, columns) in [
        ("grid_16k", gen_grid_scene(128, 8.0)),
        ("wires_4k", gen_wire_scene(4096, 1024.0)),
    ] {
        let mut index = SpatialIndex::<()>::new(columns.clone(), 1024);
        let hit = HitTester::new(3);
        let mut rng = Rng::new(0xBADC_F00D_1234_5678);
        let points: Vec<Point> = (0..256)
            .map(|_| Point::new(rng.next_f64() * 1024.0, rng.next_f64() * 1024.0))
            .collect();
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for &world in &points {
                    let ctx = HitContext {
                        world,
                        level: 1,
                        world_per_pixel: 1.0,
                    };
                    let caps = |id: understory_scene::PrimitiveId| columns.interactions(id);
                    if hit
                        .check(&mut index, caps, &ctx, Interactions::CLICK)
                        .is_some()
                    {
                        hits += 1;
                    }
                }
                black_box(hits);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_level_one,
    bench_deep_lookup,
    bench_visible_keys,
    bench_hit_test
);
criterion_main!(benches);
