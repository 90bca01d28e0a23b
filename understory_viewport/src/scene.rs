// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level owner tying geometry, tiles, workers, and input together.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kurbo::Point;
use understory_raster::{Atlas, IconDef, Surface, WorkerPool, WorkerResources};
use understory_scene::{
    GeometryStore, Highlights, PathPrimitive, Primitive, PrimitiveId, RectPrimitive,
    SpritePrimitive, TextPrimitive,
};

use crate::config::EngineConfig;
use crate::controller::ViewportController;
use crate::error::Error;
use crate::handlers::{HandlerTable, InteractionEvent, InteractionKind};
use crate::hit::{HitContext, HitTester, HoverEvent};

/// A tiled, pannable, zoomable scene rendering onto `S`.
///
/// Owns the geometry store, the viewport controller (and, through it, the
/// live tile index and worker pool), hit testing, handlers, and the output
/// surface. All methods run on the host's interactive thread.
pub struct TiledScene<S: Surface> {
    config: EngineConfig,
    store: GeometryStore,
    controller: ViewportController,
    hit: HitTester,
    handlers: HandlerTable,
    surface: S,
    atlas_loaded: bool,
}

impl<S: Surface> core::fmt::Debug for TiledScene<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TiledScene")
            .field("primitives", &self.store.len())
            .field("controller", &self.controller)
            .field("atlas_loaded", &self.atlas_loaded)
            .finish_non_exhaustive()
    }
}

impl<S: Surface> TiledScene<S> {
    /// Spawn workers and create an empty scene drawing onto `surface`.
    pub fn new(config: EngineConfig, surface: S) -> Result<Self, Error> {
        let pool = WorkerPool::new(config.worker_count)?;
        let controller = ViewportController::new(config.clone(), pool, surface.size());
        Ok(Self {
            store: GeometryStore::with_margin(config.boundary_margin),
            hit: HitTester::new(config.hit_test_min_level),
            config,
            controller,
            handlers: HandlerTable::new(),
            surface,
            atlas_loaded: false,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Geometry added so far.
    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    /// The viewport controller.
    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    /// Output surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Output surface, mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Current highlight state.
    pub fn highlights(&self) -> &Highlights {
        self.controller.highlights()
    }

    /// Primitives currently hovered.
    pub fn hovered(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.hit.hovered()
    }

    /// Add any primitive. It becomes visible after the next [`flush`](Self::flush).
    pub fn add(&mut self, primitive: impl Into<Primitive>) -> Result<PrimitiveId, Error> {
        Ok(self.store.add(primitive)?)
    }

    /// Add a rectangle.
    pub fn add_rect(&mut self, rect: RectPrimitive) -> Result<PrimitiveId, Error> {
        Ok(self.store.add_rect(rect)?)
    }

    /// Add a text run.
    pub fn add_text(&mut self, text: TextPrimitive) -> Result<PrimitiveId, Error> {
        Ok(self.store.add_text(text)?)
    }

    /// Add a bitmap sprite.
    pub fn add_image(&mut self, image: SpritePrimitive) -> Result<PrimitiveId, Error> {
        Ok(self.store.add_image(image)?)
    }

    /// Add a line segment.
    pub fn add_path(&mut self, path: PathPrimitive) -> Result<PrimitiveId, Error> {
        Ok(self.store.add_path(path)?)
    }

    /// Add a vector icon.
    pub fn add_icon(&mut self, icon: SpritePrimitive) -> Result<PrimitiveId, Error> {
        Ok(self.store.add_icon(icon)?)
    }

    /// Finalize the boundary and replace the tile index.
    pub fn flush(&mut self) {
        let columns = self.store.flush();
        self.handlers.sync(&columns);
        self.hit.clear();
        self.controller.set_scene(columns);
    }

    /// Parse the atlas once and initialise every worker with it.
    pub fn load_atlas<I, N>(&mut self, defs: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (N, IconDef)>,
        N: Into<String>,
    {
        if self.atlas_loaded {
            return Err(Error::AtlasLoaded);
        }
        let atlas = Atlas::load(defs)?;
        self.load_resources(WorkerResources::new(atlas))
    }

    /// Initialise workers with prepared resources (for a custom text painter).
    pub fn load_resources(&mut self, resources: WorkerResources) -> Result<(), Error> {
        if self.atlas_loaded {
            return Err(Error::AtlasLoaded);
        }
        self.controller.init(Arc::new(resources))?;
        self.atlas_loaded = true;
        Ok(())
    }

    /// Bind `handler` to `kind` on `id`; this grants the capability.
    pub fn on(
        &mut self,
        id: PrimitiveId,
        kind: InteractionKind,
        handler: impl FnMut(&InteractionEvent, &mut Highlights) + 'static,
    ) -> bool {
        if !self.store.add_interactions(id, kind.flag()) {
            return false;
        }
        self.handlers.on(id, kind, Box::new(handler));
        true
    }

    /// Bind a listener for presses of `kind` that hit no primitive.
    pub fn on_background(
        &mut self,
        kind: InteractionKind,
        handler: impl FnMut(&InteractionEvent, &mut Highlights) + 'static,
    ) {
        self.handlers.on_background(kind, Box::new(handler));
    }

    /// Set pan offset and zoom factor directly.
    ///
    /// The surface is recomposited at the new view right away.
    pub fn set_transform(&mut self, x: f64, y: f64, k: f64) {
        self.controller.set_transform(x, y, k);
        self.redraw_if_needed();
    }

    /// Pointer pressed: start a drag.
    pub fn pointer_down(&mut self, p: Point) {
        self.controller.pointer_down(p);
    }

    /// Pointer moved: pan while dragging, otherwise update hover.
    pub fn pointer_move(&mut self, p: Point, now: Instant) -> Vec<HoverEvent> {
        if self.controller.pointer_move(p, now) {
            self.redraw_if_needed();
            return Vec::new();
        }
        self.hover(p, now)
    }

    /// Pointer released: end the drag.
    pub fn pointer_up(&mut self, p: Point) {
        self.controller.pointer_up(p);
        self.redraw_if_needed();
    }

    /// Wheel step about `p`; negative `delta` zooms in.
    pub fn wheel(&mut self, p: Point, delta: f64, now: Instant) -> bool {
        let zoomed = self.controller.wheel(p, delta, now);
        if zoomed {
            self.redraw_if_needed();
        }
        zoomed
    }

    /// Hover hit test at surface point `p`.
    ///
    /// Skipped while hover is suppressed after a zoom.
    pub fn hover(&mut self, p: Point, now: Instant) -> Vec<HoverEvent> {
        if self.controller.hover_suppressed(now) {
            return Vec::new();
        }
        let ctx = self.hit_context(p);
        let handlers = &self.handlers;
        let events = self.hit.hover(
            self.controller.index_mut(),
            |id| handlers.capabilities(id),
            &ctx,
        );
        for &ev in &events {
            let event = match ev {
                HoverEvent::Enter(id) => InteractionEvent::HoverEnter(id),
                HoverEvent::Leave(id) => InteractionEvent::HoverLeave(id),
            };
            self.run(Some(ev.target()), InteractionKind::Hover, &event, false);
        }
        events
    }

    /// Primary click at surface point `p`.
    pub fn click(&mut self, p: Point) -> Option<PrimitiveId> {
        self.press(p, InteractionKind::Click)
    }

    /// Secondary click at surface point `p`.
    pub fn right_click(&mut self, p: Point) -> Option<PrimitiveId> {
        self.press(p, InteractionKind::RightClick)
    }

    /// Double click at surface point `p`.
    pub fn double_click(&mut self, p: Point) -> Option<PrimitiveId> {
        self.press(p, InteractionKind::DoubleClick)
    }

    /// Resolve a click-family press.
    ///
    /// The topmost primitive with the capability gets its handler invoked and
    /// its tiles marked dirty; otherwise the background listener runs.
    pub fn press(&mut self, p: Point, kind: InteractionKind) -> Option<PrimitiveId> {
        let ctx = self.hit_context(p);
        let handlers = &self.handlers;
        let target = self.hit.check(
            self.controller.index_mut(),
            |id| handlers.capabilities(id),
            &ctx,
            kind.flag(),
        );
        let event = InteractionEvent::Press {
            kind,
            target,
            world: ctx.world,
        };
        self.run(target, kind, &event, true);
        target
    }

    /// Surface size changed; applied after the debounce delay.
    pub fn resize(&mut self, width: u32, height: u32, now: Instant) {
        self.controller.schedule_resize(now, width, height);
    }

    /// Maintenance: apply a due resize, then run the controller tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some((w, h)) = self.controller.poll_resize(now) {
            self.surface.resize(w, h);
        }
        self.controller.tick(now)
    }

    /// Apply arrived completions without dispatching.
    pub fn pump(&mut self) -> usize {
        self.controller.pump()
    }

    /// Render every visible tile and wait, for headless hosts.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        self.controller.settle(timeout)
    }

    /// Whether the surface is out of date.
    pub fn needs_redraw(&self) -> bool {
        self.controller.needs_redraw()
    }

    /// Composite visible tiles onto the surface.
    pub fn redraw(&mut self) {
        self.controller.redraw(&mut self.surface);
    }

    fn redraw_if_needed(&mut self) {
        if self.controller.needs_redraw() {
            self.redraw();
        }
    }

    fn hit_context(&self, p: Point) -> HitContext {
        HitContext {
            world: self.controller.screen_to_world(p),
            level: self.controller.level(),
            world_per_pixel: self.controller.transform().world_per_pixel(),
        }
    }

    /// Invoke the handler for `target` (or the background listener) and mark
    /// every primitive whose highlight changed dirty, plus `target` itself if
    /// `always_dirty`.
    fn run(
        &mut self,
        target: Option<PrimitiveId>,
        kind: InteractionKind,
        event: &InteractionEvent,
        always_dirty: bool,
    ) {
        let before = self.controller.highlights().clone();
        let highlights = self.controller.highlights_mut();
        match target {
            Some(id) => self.handlers.invoke(id, kind, event, highlights),
            None => self.handlers.invoke_background(kind, event, highlights),
        };
        let mut dirty: BTreeSet<PrimitiveId> =
            if self.controller.highlights().revision() == before.revision() {
                BTreeSet::new()
            } else {
                before.diff(self.controller.highlights())
            };
        if always_dirty {
            dirty.extend(target);
        }
        for id in dirty {
            self.controller.mark_primitive_dirty(id);
        }
    }
}
