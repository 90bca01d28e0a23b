// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Messages exchanged between the controller and rasterization workers.
//!
//! Every request carries immutable snapshots (scene columns, membership,
//! highlights) so workers never read shared mutable state.

use std::fmt;
use std::sync::Arc;

use kurbo::Vec2;
use tiny_skia::Pixmap;
use understory_scene::{Highlights, Member, PrimitiveId, SceneColumns};
use understory_tiles::TileKey;

use crate::atlas::Atlas;
use crate::paint::Painter;
use crate::text::{ShapedTextPainter, TextPainter};

/// Read-only resources handed to each worker once.
pub struct WorkerResources {
    /// Icons and sprites.
    pub atlas: Atlas,
    /// Text painting.
    pub text: Box<dyn TextPainter>,
}

impl WorkerResources {
    /// Resources with the default [`ShapedTextPainter`].
    pub fn new(atlas: Atlas) -> Self {
        Self {
            atlas,
            text: Box::new(ShapedTextPainter::new()),
        }
    }

    /// Replace the text painter.
    pub fn with_text_painter(mut self, text: impl TextPainter + 'static) -> Self {
        self.text = Box::new(text);
        self
    }
}

impl fmt::Debug for WorkerResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerResources")
            .field("atlas", &self.atlas.len())
            .finish_non_exhaustive()
    }
}

/// Which job produced a completion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Full render into a fresh raster.
    Render,
    /// Incremental repaint of dirty footprints.
    RePatch,
}

/// Routing key of a completion: `(level, index, kind)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompletionKey {
    /// Tile level.
    pub level: u8,
    /// Tile index within the level.
    pub index: u64,
    /// Job kind.
    pub kind: RequestKind,
}

impl CompletionKey {
    /// Key for a job of `kind` on `tile`.
    pub const fn new(tile: TileKey, kind: RequestKind) -> Self {
        Self {
            level: tile.level,
            index: tile.index,
            kind,
        }
    }

    /// The tile this key addresses.
    pub const fn tile(self) -> TileKey {
        TileKey::new(self.level, self.index)
    }
}

/// Per-tile inputs shared by both job kinds.
#[derive(Clone)]
pub struct TileJob {
    /// Scene session the tile belongs to; echoed in the [`Response`].
    pub session: u64,
    /// Target tile.
    pub key: TileKey,
    /// Scene snapshot.
    pub columns: Arc<SceneColumns>,
    /// Tile membership in z order.
    pub members: Arc<[Member]>,
    /// Highlight snapshot taken at dispatch.
    pub highlights: Arc<Highlights>,
    /// Pixels per world unit.
    pub scale: f64,
    /// Pixel offset: `pixel = world * scale + offset`.
    pub offset: Vec2,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl TileJob {
    /// Painter over this job's snapshots.
    pub fn painter<'a>(&'a self, resources: &'a WorkerResources) -> Painter<'a> {
        Painter::new(
            &self.columns,
            resources,
            &self.highlights,
            self.scale,
            self.offset,
        )
    }
}

impl fmt::Debug for TileJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileJob")
            .field("session", &self.session)
            .field("key", &self.key)
            .field("members", &self.members.len())
            .field("scale", &self.scale)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Controller → worker message.
#[derive(Debug)]
pub enum Request {
    /// Install resources; sent exactly once per worker.
    Init(Arc<WorkerResources>),
    /// Paint every member into a fresh raster.
    Render(TileJob),
    /// Repaint the footprints of `dirty` on a copy of `raster`.
    RePatch {
        /// Tile inputs.
        job: TileJob,
        /// Current raster.
        raster: Arc<Pixmap>,
        /// Deduplicated dirty ids.
        dirty: Vec<PrimitiveId>,
    },
    /// Exit the worker loop.
    Shutdown,
}

impl Request {
    /// Session and routing key of the completion this request produces, if any.
    pub fn completion_key(&self) -> Option<(u64, CompletionKey)> {
        match self {
            Self::Render(job) => Some((
                job.session,
                CompletionKey::new(job.key, RequestKind::Render),
            )),
            Self::RePatch { job, .. } => Some((
                job.session,
                CompletionKey::new(job.key, RequestKind::RePatch),
            )),
            Self::Init(_) | Self::Shutdown => None,
        }
    }
}

/// Worker → controller message.
#[derive(Clone)]
pub struct Response {
    /// Worker that produced it.
    pub worker: usize,
    /// Session of the originating job.
    pub session: u64,
    /// Routing key.
    pub key: CompletionKey,
    /// Resulting raster; `None` if nothing could be painted.
    pub raster: Option<Arc<Pixmap>>,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("worker", &self.worker)
            .field("session", &self.session)
            .field("key", &self.key)
            .field("has_raster", &self.raster.is_some())
            .finish()
    }
}
