// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Raster: off-thread rasterization of tiles.
//!
//! - [`Atlas`] parses icon sources (SVG path data, polygons, RGBA bitmaps) once, with optional
//!   hover and checked variants per entry.
//! - [`Painter`] paints a tile's members into a [`tiny_skia::Pixmap`], either fully
//!   ([`Painter::render`]) or by repainting the footprints of dirty primitives
//!   ([`Painter::repatch`]).
//! - [`WorkerPool`] runs painters on a fixed set of threads. Workers receive [`Request::Init`]
//!   once, then [`Request::Render`] and [`Request::RePatch`] jobs carrying immutable snapshots.
//!   Dispatch never queues; a busy pool answers [`DispatchError::Backoff`].
//! - [`CompletionRouter`] hands each completion to the one waiter registered for its
//!   `(level, index, kind)` key.
//! - [`Surface`] is the compositing target, with [`PixmapSurface`] for real output and
//!   [`RecordingSurface`] for tests.
//!
//! Text is painted through the [`TextPainter`] seam. The default [`ShapedTextPainter`] shapes
//! with `cosmic-text`; [`GreekingPainter`] draws glyph blocks for overview levels.

pub mod atlas;
pub mod error;
pub mod paint;
pub mod pool;
pub mod protocol;
pub mod router;
pub mod surface;
pub mod text;

pub use atlas::{Atlas, AtlasEntry, IconDef, IconSource, Sprite};
pub use error::{AtlasError, DispatchError};
pub use paint::Painter;
pub use pool::WorkerPool;
pub use protocol::{CompletionKey, Request, RequestKind, Response, TileJob, WorkerResources};
pub use router::CompletionRouter;
pub use surface::{PixmapSurface, RecordingSurface, Surface};
pub use text::{GreekingPainter, ShapedTextPainter, TextPainter};

pub use tiny_skia::Pixmap;
