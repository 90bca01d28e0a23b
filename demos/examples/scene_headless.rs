// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render a scene headlessly and write it to a PNG.
//!
//! Loads a small atlas with a hover variant, binds a click handler that
//! toggles the checked highlight, clicks it, and writes the composited
//! surface to the system temp directory.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_examples --example scene_headless`

use std::time::Duration;

use kurbo::{Point, Rect, Size};
use understory_raster::{IconDef, IconSource, PixmapSurface};
use understory_scene::{
    AtlasIndex, Color, FillMode, Interactions, LineCap, PathPrimitive, RectPrimitive,
    SpritePrimitive, TextPrimitive,
};
use understory_viewport::{EngineConfig, InteractionEvent, InteractionKind, TiledScene};

const TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    env_logger::init();

    let config = EngineConfig {
        worker_count: 2,
        tile_size: 256,
        ..EngineConfig::default()
    };
    let mut scene = TiledScene::new(config, PixmapSurface::new(512, 512).unwrap()).unwrap();

    let card = scene
        .add_rect(RectPrimitive {
            rect: Rect::new(20.0, 20.0, 220.0, 140.0),
            fill: Color::rgb(230, 236, 245),
            stroke: Color::rgb(40, 60, 90),
            stroke_width: 2.0,
            mode: FillMode::FillAndStroke,
            interactions: Interactions::HOVER,
            ..Default::default()
        })
        .unwrap();
    scene
        .add_text(TextPrimitive {
            center: Point::new(120.0, 50.0),
            size: Size::new(160.0, 20.0),
            font_size: 14.0,
            content: "Greeked title".into(),
            z: 1,
            ..Default::default()
        })
        .unwrap();
    let toggle = scene
        .add_icon(SpritePrimitive {
            rect: Rect::new(180.0, 100.0, 210.0, 130.0),
            entry: AtlasIndex(0),
            z: 2,
            ..Default::default()
        })
        .unwrap();
    scene
        .add_path(PathPrimitive {
            from: Point::new(220.0, 80.0),
            to: Point::new(400.0, 300.0),
            color: Color::rgb(200, 60, 60),
            width: 1.5,
            cap: LineCap::Round,
            dash: vec![6.0, 3.0],
            keep_width: true,
            ..Default::default()
        })
        .unwrap();
    scene
        .add_rect(RectPrimitive {
            rect: Rect::new(360.0, 280.0, 480.0, 360.0),
            fill: Color::rgb(120, 200, 140),
            ..Default::default()
        })
        .unwrap();

    scene.on(toggle, InteractionKind::Click, move |ev, highlights| {
        if let InteractionEvent::Press { world, .. } = ev {
            log::info!("toggle clicked at {world:?}");
        }
        highlights.toggle_checked(toggle);
    });
    scene.on(card, InteractionKind::Hover, |ev, highlights| match *ev {
        InteractionEvent::HoverEnter(id) => {
            highlights.set_hovered(id, true);
        }
        InteractionEvent::HoverLeave(id) => {
            highlights.set_hovered(id, false);
        }
        InteractionEvent::Press { .. } => {}
    });
    scene.flush();

    let circle = "M 12 2 C 17.5 2 22 6.5 22 12 C 22 17.5 17.5 22 12 22 \
                  C 6.5 22 2 17.5 2 12 C 2 6.5 6.5 2 12 2 Z";
    let icons = [(
        "toggle",
        IconDef {
            normal: IconSource::Svg {
                data: circle.into(),
                color: Color::rgb(150, 150, 150),
            },
            hover: None,
            checked: Some(IconSource::Svg {
                data: circle.into(),
                color: Color::rgb(30, 160, 80),
            }),
        },
    )];
    scene.load_atlas(icons).unwrap();
    assert!(scene.settle(TIMEOUT), "initial render timed out");

    let at = scene.controller().world_to_screen(Point::new(195.0, 115.0));
    let hit = scene.click(at);
    println!("clicked: {hit:?}");
    assert!(scene.settle(TIMEOUT), "patch timed out");
    scene.redraw();
    println!("stats: {:?}", scene.controller().stats());

    let out = std::env::temp_dir().join("understory_scene_headless.png");
    scene.surface().pixmap().save_png(&out).unwrap();
    println!("wrote {}", out.display());
}
