// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Size};
use understory_raster::{Atlas, Painter, WorkerResources};
use understory_scene::{
    Color, GeometryStore, Highlights, PathPrimitive, PrimitiveId, RectPrimitive, SceneColumns,
    TextPrimitive,
};
use understory_tiles::SpatialIndex;

fn gen_board(n: usize, cell: f64) -> Arc<SceneColumns> {
    let mut store = GeometryStore::new();
    for y in 0..n {
        for x in 0..n {
            let x0 = x as f64 * cell;
            let y0 = y as f64 * cell;
            store
                .add_rect(RectPrimitive {
                    rect: Rect::new(x0, y0, x0 + cell * 0.8, y0 + cell * 0.8),
                    fill: Color::rgb(40, 120, 200),
                    stroke_width: 1.0,
                    ..Default::default()
                })
                .unwrap();
            store
                .add_text(TextPrimitive {
                    center: Point::new(x0 + cell * 0.4, y0 + cell * 0.4),
                    size: Size::new(cell * 0.6, cell * 0.3),
                    font_size: cell * 0.2,
                    content: format!("{x},{y}"),
                    z: 1,
                    ..Default::default()
                })
                .unwrap();
            if x > 0 {
                store
                    .add_path(PathPrimitive {
                        from: Point::new(x0 - cell * 0.2, y0 + cell * 0.4),
                        to: Point::new(x0, y0 + cell * 0.4),
                        width: 1.0,
                        keep_width: true,
                        z: 2,
                        ..Default::default()
                    })
                    .unwrap();
            }
        }
    }
    store.flush()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_render");
    let columns = gen_board(32, 32.0);
    let resources = WorkerResources::new(Atlas::new());
    let highlights = Highlights::new();
    for tile_size in [256_u32, 1024] {
        let mut index = SpatialIndex::<()>::new(columns.clone(), tile_size);
        let tile = index.get_tile(1, 0).unwrap();
        let t = index.tile(tile);
        let scale = index.grid().pixel_scale(1);
        let (w, h) = index.grid().raster_size(1);
        let painter = Painter::new(
            &columns,
            &resources,
            &highlights,
            scale,
            -t.rect().origin().to_vec2() * scale,
        );
        group.throughput(Throughput::Elements(t.members().len() as u64));
        group.bench_function(format!("level_one_{tile_size}"), |b| {
            b.iter(|| black_box(painter.render(t.members(), w, h)));
        });
    }
    group.finish();
}

fn bench_repatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("tile_repatch");
    let columns = gen_board(32, 32.0);
    let resources = WorkerResources::new(Atlas::new());
    let highlights = Highlights::new();
    let mut index = SpatialIndex::<()>::new(columns.clone(), 512);
    let tile = index.get_tile(1, 0).unwrap();
    let t = index.tile(tile);
    let scale = index.grid().pixel_scale(1);
    let (w, h) = index.grid().raster_size(1);
    let painter = Painter::new(
        &columns,
        &resources,
        &highlights,
        scale,
        -t.rect().origin().to_vec2() * scale,
    );
    let base = painter.render(t.members(), w, h).unwrap();
    for count in [1_u32, 16] {
        let dirty: Vec<PrimitiveId> = (0..count).map(|i| PrimitiveId(i * 3)).collect();
        group.bench_function(format!("dirty_{count}"), |b| {
            b.iter_batched(
                || base.clone(),
                |mut pixmap| {
                    painter.repatch(&mut pixmap, t.members(), &dirty);
                    black_box(pixmap);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render, bench_repatch);
criterion_main!(benches);
