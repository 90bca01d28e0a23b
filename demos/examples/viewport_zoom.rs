// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated wheel zoom and drag pan against a recording surface.
//!
//! Each step prints the zoom factor, the active level, and how many tiles
//! are visible and drawn after the maintenance tick.
//!
//! Run:
//! - `cargo run -p understory_examples --example viewport_zoom`

use std::time::{Duration, Instant};

use kurbo::{Point, Rect};
use understory_raster::RecordingSurface;
use understory_scene::RectPrimitive;
use understory_viewport::{EngineConfig, TiledScene};

fn main() {
    env_logger::init();

    let config = EngineConfig {
        worker_count: 4,
        tile_size: 256,
        ..EngineConfig::default()
    };
    let mut scene = TiledScene::new(config, RecordingSurface::new(800, 600)).unwrap();
    for y in 0..40 {
        for x in 0..40 {
            let (x0, y0) = (f64::from(x) * 25.0, f64::from(y) * 25.0);
            scene
                .add_rect(RectPrimitive {
                    rect: Rect::new(x0, y0, x0 + 20.0, y0 + 20.0),
                    ..Default::default()
                })
                .unwrap();
        }
    }
    scene.flush();
    scene.load_atlas(Vec::<(String, _)>::new()).unwrap();

    let mut now = Instant::now();
    let step = Duration::from_millis(70);
    let cursor = Point::new(400.0, 300.0);
    let report = |scene: &mut TiledScene<RecordingSurface>, now: Instant, what: &str| {
        scene.settle(Duration::from_secs(5));
        scene.tick(now);
        scene.redraw();
        println!(
            "{what:>6}: k = {:7.3}, level {}, {} visible, {} drawn",
            scene.controller().transform().k,
            scene.controller().level(),
            scene.controller().visible().len(),
            scene.surface().draws.len()
        );
    };

    report(&mut scene, now, "start");
    for _ in 0..40 {
        now += step;
        scene.wheel(cursor, -1.0, now);
    }
    report(&mut scene, now, "zoomed");

    scene.pointer_down(cursor);
    for i in 1..=10 {
        now += step;
        scene.pointer_move(cursor + (f64::from(i) * 20.0, 0.0), now);
    }
    scene.pointer_up(cursor + (200.0, 0.0));
    report(&mut scene, now, "panned");

    let mut refused = 0;
    for _ in 0..80 {
        now += step;
        if !scene.wheel(cursor, 1.0, now) {
            refused += 1;
        }
    }
    report(&mut scene, now, "out");
    println!("zoom-out steps refused at the minimum scale: {refused}");
    println!("stats: {:?}", scene.controller().stats());
}
