// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport controller: transform, visible tiles, dispatch, and compositing.
//!
//! ## Overview
//!
//! The controller owns the live [`SpatialIndex`], the [`WorkerPool`], and the
//! completion router. It is the only writer of tile state:
//!
//! - A transform change picks the level for the zoom factor, resolves the
//!   visible tiles, and dispatches a Render for each Unrendered one.
//! - The maintenance [`tick`](ViewportController::tick) settles ReRendering
//!   tiles by dispatching one RePatch each, and retries tiles that backed off.
//! - Completions are drained with [`pump`](ViewportController::pump) and
//!   applied to their tiles; stale ones are dropped.
//!
//! ## Redraw
//!
//! [`redraw`](ViewportController::redraw) composites Rendered and ReRendering
//! rasters at `screen = offset + k * base * (world - boundary.origin)`. Tiles
//! without a raster leave gaps.

use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kurbo::{Point, Vec2};
use understory_raster::{
    CompletionKey, CompletionRouter, DispatchError, Pixmap, Request, RequestKind, Response,
    Surface, TileJob, WorkerPool, WorkerResources,
};
use understory_scene::{Highlights, PrimitiveId, SceneColumns};
use understory_tiles::{Completion, SpatialIndex, TileId, level_for_scale};

use crate::config::EngineConfig;
use crate::gesture::{Debouncer, DragAnchor, RateLimiter, Suppression};
use crate::transform::{ViewTransform, fit_scale};

/// Running totals of dispatch activity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Render requests sent.
    pub renders: u64,
    /// RePatch requests sent.
    pub patches: u64,
    /// Dirty ids carried by all RePatch requests.
    pub patched_ids: u64,
    /// Dispatch attempts refused for lack of an idle worker.
    pub backoffs: u64,
    /// Completions dropped because their level or session was no longer current.
    pub stale: u64,
}

/// Drives tiles from the current pan/zoom state.
pub struct ViewportController {
    config: EngineConfig,
    pool: WorkerPool,
    router: CompletionRouter<TileId>,
    index: SpatialIndex<Pixmap>,
    highlights: Arc<Highlights>,
    session: u64,
    transform: ViewTransform,
    surface: (u32, u32),
    level: u8,
    visible: Vec<TileId>,
    redraw: bool,
    gestures: RateLimiter,
    drag: Option<DragAnchor>,
    hover_block: Suppression,
    resize: Debouncer<(u32, u32)>,
    last_tick: Option<Instant>,
    stats: DispatchStats,
}

impl core::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewportController")
            .field("transform", &self.transform)
            .field("surface", &self.surface)
            .field("level", &self.level)
            .field("visible", &self.visible.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ViewportController {
    /// Create a controller over an empty scene for a `width × height` surface.
    pub fn new(config: EngineConfig, pool: WorkerPool, (width, height): (u32, u32)) -> Self {
        let index = SpatialIndex::with_max_level(
            Arc::new(SceneColumns::default()),
            config.tile_size,
            config.max_level,
        );
        Self {
            gestures: RateLimiter::new(config.gesture_interval),
            resize: Debouncer::new(config.resize_debounce),
            config,
            pool,
            router: CompletionRouter::new(),
            index,
            highlights: Arc::new(Highlights::new()),
            session: 0,
            transform: ViewTransform::default(),
            surface: (width, height),
            level: 1,
            visible: Vec::new(),
            redraw: true,
            drag: None,
            hover_block: Suppression::default(),
            last_tick: None,
            stats: DispatchStats::default(),
        }
    }

    /// Replace the scene with a freshly flushed snapshot.
    ///
    /// Starts a new session: a new index is built and completions of requests
    /// dispatched for the old one are discarded on arrival.
    pub fn set_scene(&mut self, columns: Arc<SceneColumns>) {
        self.session += 1;
        self.router = CompletionRouter::new();
        self.transform.origin = columns.boundary().origin();
        self.index =
            SpatialIndex::with_max_level(columns, self.config.tile_size, self.config.max_level);
        self.refit();
        log::debug!(
            "scene session {} with {} primitives",
            self.session,
            self.index.columns().len()
        );
        self.refresh();
    }

    /// Send resources to the workers, then render what is visible.
    pub fn init(&mut self, resources: Arc<WorkerResources>) -> Result<(), DispatchError> {
        self.pool.init(resources)?;
        self.dispatch_renders();
        Ok(())
    }

    /// Whether workers have their resources.
    pub fn is_initialized(&self) -> bool {
        self.pool.is_initialized()
    }

    /// Set pan offset and zoom factor.
    pub fn set_transform(&mut self, x: f64, y: f64, k: f64) {
        self.transform.offset = Vec2::new(x, y);
        self.transform.k = k;
        self.refresh();
    }

    /// Current transform.
    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    /// Active level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Visible tiles at the active level.
    pub fn visible(&self) -> &[TileId] {
        &self.visible
    }

    /// Surface size the view is laid out for.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    /// The live index.
    pub fn index(&self) -> &SpatialIndex<Pixmap> {
        &self.index
    }

    /// The live index, for lazy tile construction and dirty marks.
    pub fn index_mut(&mut self) -> &mut SpatialIndex<Pixmap> {
        &mut self.index
    }

    /// Highlight state painted by workers.
    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    /// Mutable highlight state; in-flight requests keep their own snapshot.
    pub fn highlights_mut(&mut self) -> &mut Highlights {
        Arc::make_mut(&mut self.highlights)
    }

    /// Dispatch totals.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Whether something changed since the last [`redraw`](Self::redraw).
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Map a surface point to world coordinates.
    pub fn screen_to_world(&self, p: Point) -> Point {
        self.transform.screen_to_world(p)
    }

    /// Map a world point to the surface.
    pub fn world_to_screen(&self, p: Point) -> Point {
        self.transform.world_to_screen(p)
    }

    /// Queue `id` on every tile listing it.
    pub fn mark_primitive_dirty(&mut self, id: PrimitiveId) {
        let tiles = self.index.mark_primitive_dirty(id);
        log::trace!("{id:?} dirty on {} tiles", tiles.len());
    }

    /// Begin a drag at `pointer`.
    pub fn pointer_down(&mut self, pointer: Point) {
        self.drag = Some(DragAnchor {
            pointer,
            offset: self.transform.offset,
        });
    }

    /// Follow the pointer while dragging. Returns true if a drag is active.
    pub fn pointer_move(&mut self, pointer: Point, now: Instant) -> bool {
        let Some(anchor) = self.drag else {
            return false;
        };
        if self.gestures.allow(now) {
            self.transform.offset = anchor.offset_for(pointer);
            self.refresh();
        }
        true
    }

    /// End a drag, applying the final position.
    pub fn pointer_up(&mut self, pointer: Point) {
        if let Some(anchor) = self.drag.take() {
            self.transform.offset = anchor.offset_for(pointer);
            self.refresh();
        }
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Zoom one step about `cursor`; negative `delta` zooms in.
    ///
    /// Returns false if rate limited, if `delta` is zero, or if the zoom
    /// would go below the minimum scale.
    pub fn wheel(&mut self, cursor: Point, delta: f64, now: Instant) -> bool {
        if delta == 0.0 || !delta.is_finite() {
            return false;
        }
        let ratio = if delta < 0.0 {
            self.config.zoom_step
        } else {
            1.0 / self.config.zoom_step
        };
        if self.transform.k * ratio < self.config.min_scale {
            return false;
        }
        if !self.gestures.allow(now) {
            return false;
        }
        self.transform.zoom_about(cursor, ratio);
        self.hover_block.start(now, self.config.hover_suppression);
        self.refresh();
        true
    }

    /// Whether hover hit tests are blocked after a recent zoom.
    pub fn hover_suppressed(&self, now: Instant) -> bool {
        self.hover_block.is_active(now)
    }

    /// Record a surface size change; applied once it is stable.
    pub fn schedule_resize(&mut self, now: Instant, width: u32, height: u32) {
        self.resize.schedule(now, (width, height));
    }

    /// Apply a debounced resize if due, returning the new size.
    pub fn poll_resize(&mut self, now: Instant) -> Option<(u32, u32)> {
        let size = self.resize.poll(now)?;
        self.apply_resize(size);
        Some(size)
    }

    fn apply_resize(&mut self, size: (u32, u32)) {
        log::debug!("resize to {}x{}", size.0, size.1);
        self.surface = size;
        self.index.invalidate_rasters();
        self.refit();
        self.refresh();
    }

    /// Maintenance step, run at most once per `tick_period`.
    ///
    /// Applies completions, sends one RePatch per ReRendering visible tile,
    /// and retries Unrendered visible tiles. Returns false if throttled.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < self.config.tick_period {
                return false;
            }
        }
        self.last_tick = Some(now);
        self.pump();
        self.dispatch_patches();
        self.dispatch_renders();
        true
    }

    /// Apply every completion that has arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Some(response) = self.pool.try_recv() {
            self.apply(response);
            n += 1;
        }
        n
    }

    /// Block until no request is in flight or `timeout` passes.
    ///
    /// Returns true if idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.index.in_flight() == 0 {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Some(response) = self.pool.recv_timeout(remaining) {
                self.apply(response);
            }
        }
    }

    /// Dispatch and wait until every visible tile is settled or `timeout` passes.
    ///
    /// For headless hosts and tests; interactive hosts use [`tick`](Self::tick).
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.dispatch_patches();
            self.dispatch_renders();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !self.wait_idle(remaining) {
                return false;
            }
            let pending = self.visible.iter().any(|&t| {
                self.index.can_render(t) || self.index.patch_ticket(t).is_some()
            });
            if !pending || !self.pool.is_initialized() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
        }
    }

    /// Composite visible rasters onto `surface`.
    pub fn redraw(&mut self, surface: &mut impl Surface) {
        surface.clear();
        for &t in &self.visible {
            let tile = self.index.tile(t);
            if let Some(raster) = tile.drawable() {
                let dest = self.index.grid().raster_rect(tile.key());
                surface.draw_tile(raster, self.transform.rect_to_screen(dest));
            }
        }
        self.redraw = false;
    }

    fn refit(&mut self) {
        let (w, h) = self.surface;
        self.transform.base = fit_scale(self.index.columns().boundary(), w, h);
    }

    fn refresh(&mut self) {
        self.level = level_for_scale(self.transform.k, self.index.max_level());
        let world = self.transform.visible_world(self.surface.0, self.surface.1);
        let keys = self.index.grid().keys_overlapping(self.level, world);
        self.visible = keys
            .into_iter()
            .filter_map(|k| self.index.get_tile_by_key(k))
            .collect();
        self.redraw = true;
        self.dispatch_renders();
    }

    fn job(&self, tile: TileId) -> TileJob {
        let t = self.index.tile(tile);
        let key = t.key();
        let grid = self.index.grid();
        let scale = grid.pixel_scale(key.level);
        let (width, height) = grid.raster_size(key.level);
        TileJob {
            session: self.session,
            key,
            columns: self.index.columns().clone(),
            members: t.members().clone(),
            highlights: self.highlights.clone(),
            scale,
            offset: -t.rect().origin().to_vec2() * scale,
            width,
            height,
        }
    }

    fn dispatch_renders(&mut self) {
        if !self.pool.is_initialized() {
            return;
        }
        let visible = mem::take(&mut self.visible);
        for &t in &visible {
            if !self.index.can_render(t) {
                continue;
            }
            let job = self.job(t);
            let key = CompletionKey::new(job.key, RequestKind::Render);
            match self.pool.dispatch(Request::Render(job)) {
                Ok(worker) => {
                    self.index.begin_render(t);
                    self.router.subscribe(key, t);
                    self.stats.renders += 1;
                    log::debug!("render {}:{} on worker {worker}", key.level, key.index);
                }
                Err(e) => {
                    self.note_refusal(e);
                    break;
                }
            }
        }
        self.visible = visible;
    }

    fn dispatch_patches(&mut self) {
        if !self.pool.is_initialized() {
            return;
        }
        let visible = mem::take(&mut self.visible);
        for &t in &visible {
            let Some(ticket) = self.index.patch_ticket(t) else {
                continue;
            };
            let job = self.job(t);
            let key = CompletionKey::new(job.key, RequestKind::RePatch);
            let ids = ticket.dirty.len() as u64;
            let request = Request::RePatch {
                job,
                raster: ticket.raster,
                dirty: ticket.dirty,
            };
            match self.pool.dispatch(request) {
                Ok(worker) => {
                    self.index.begin_patch(t);
                    self.router.subscribe(key, t);
                    self.stats.patches += 1;
                    self.stats.patched_ids += ids;
                    log::debug!(
                        "repatch {}:{} ({ids} ids) on worker {worker}",
                        key.level,
                        key.index
                    );
                }
                Err(e) => {
                    self.note_refusal(e);
                    break;
                }
            }
        }
        self.visible = visible;
    }

    fn note_refusal(&mut self, e: DispatchError) {
        match e {
            DispatchError::Backoff => self.stats.backoffs += 1,
            DispatchError::NotInitialized => {}
            DispatchError::Disconnected(w) => log::warn!("worker {w} is gone; dispatch stalled"),
        }
    }

    fn apply(&mut self, response: Response) {
        if response.session != self.session {
            self.stats.stale += 1;
            log::debug!("dropping {:?} from session {}", response.key, response.session);
            return;
        }
        let Some(tile) = self.router.publish(response.key) else {
            log::warn!("completion {:?} has no waiter", response.key);
            return;
        };
        let Some(raster) = response.raster else {
            self.index.release(tile);
            return;
        };
        let outcome = match response.key.kind {
            RequestKind::Render => self.index.finish_render(tile, raster, self.level),
            RequestKind::RePatch => self.index.finish_patch(tile, raster),
        };
        match outcome {
            Completion::Applied => self.redraw = true,
            Completion::Stale => {
                self.stats.stale += 1;
                log::debug!("stale render for {:?}", response.key);
            }
            Completion::Invalidated => {}
        }
    }
}
