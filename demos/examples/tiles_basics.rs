// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile levels and lazily refined membership.
//!
//! Builds a small scene, then walks from a level-1 tile down to a deep tile
//! under one point, printing how membership narrows on the way.
//!
//! Run:
//! - `cargo run -p understory_examples --example tiles_basics`

use kurbo::{Point, Rect};
use understory_scene::{GeometryStore, PathPrimitive, RectPrimitive};
use understory_tiles::{SpatialIndex, level_for_scale, side_number};

fn main() {
    let mut store = GeometryStore::new();
    for i in 0..10 {
        let x = f64::from(i) * 100.0;
        store
            .add_rect(RectPrimitive {
                rect: Rect::new(x, 0.0, x + 80.0, 80.0),
                z: i,
                ..Default::default()
            })
            .unwrap();
    }
    // A hairline that stays one pixel wide at every zoom.
    store
        .add_path(PathPrimitive {
            from: Point::new(0.0, 40.0),
            to: Point::new(980.0, 40.0),
            width: 1.0,
            keep_width: true,
            ..Default::default()
        })
        .unwrap();
    let columns = store.flush();
    println!("boundary: {:?}", columns.boundary());

    let mut index = SpatialIndex::<()>::new(columns, 1024);
    let probe = Point::new(150.0, 40.0);
    for level in 1..=5 {
        let key = index.grid().key_at(level, probe).unwrap();
        let tile = index.get_tile_by_key(key).unwrap();
        let t = index.tile(tile);
        println!(
            "level {level}: {} tiles per side, tile {} at {:?} holds {} primitives",
            side_number(level),
            key.index,
            t.rect(),
            t.members().len()
        );
    }
    println!("tiles built: {}", index.len());

    for k in [0.5, 1.0, 5.0, 20.0, 100.0] {
        println!("zoom {k}: level {}", level_for_scale(k, index.max_level()));
    }
}
