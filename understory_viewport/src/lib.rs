// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Viewport: pan/zoom, hit testing, and the tiled scene owner.
//!
//! A [`TiledScene`] accepts primitives, flushes them into a multi-resolution
//! tile index, and keeps the tiles a viewport shows rasterized by a pool of
//! worker threads. Everything here runs on the host's interactive thread;
//! workers only ever see immutable snapshots.
//!
//! - [`ViewportController`] maps the zoom factor to a level, resolves visible
//!   tiles, dispatches Render and RePatch requests, and composites rasters.
//! - [`HitTester`] answers hover and click queries from tile membership.
//! - [`HandlerTable`] binds interaction handlers to primitives.
//!
//! Hosts call [`TiledScene::tick`] about every [`EngineConfig::tick_period`]
//! and [`TiledScene::redraw`] when [`TiledScene::needs_redraw`] is set.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use kurbo::Rect;
//! use understory_raster::RecordingSurface;
//! use understory_scene::RectPrimitive;
//! use understory_viewport::{EngineConfig, InteractionKind, TiledScene};
//!
//! let config = EngineConfig {
//!     worker_count: 1,
//!     tile_size: 128,
//!     ..EngineConfig::default()
//! };
//! let mut scene = TiledScene::new(config, RecordingSurface::new(200, 200)).unwrap();
//! let id = scene
//!     .add_rect(RectPrimitive {
//!         rect: Rect::new(0.0, 0.0, 100.0, 100.0),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! scene.on(id, InteractionKind::Click, move |_, highlights| {
//!     highlights.toggle_checked(id);
//! });
//! scene.flush();
//! scene.load_atlas(Vec::<(String, _)>::new()).unwrap();
//! assert!(scene.settle(Duration::from_secs(5)));
//! scene.redraw();
//! assert!(!scene.surface().draws.is_empty());
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod handlers;
pub mod hit;
pub mod scene;
pub mod transform;

pub use config::EngineConfig;
pub use controller::{DispatchStats, ViewportController};
pub use error::Error;
pub use gesture::{Debouncer, DragAnchor, RateLimiter, Suppression};
pub use handlers::{Handler, HandlerTable, InteractionEvent, InteractionKind};
pub use hit::{HitContext, HitTester, HoverEvent};
pub use scene::TiledScene;
pub use transform::{ViewTransform, fit_scale};
