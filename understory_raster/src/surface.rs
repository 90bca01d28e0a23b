// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output surfaces that tile rasters are composited onto.

use kurbo::{Affine, Rect};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint};

use crate::paint::to_transform;

/// A drawable target in surface pixels.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Change the size; contents are undefined afterwards.
    fn resize(&mut self, width: u32, height: u32);

    /// Erase everything.
    fn clear(&mut self);

    /// Draw `raster` stretched onto `dest`.
    fn draw_tile(&mut self, raster: &Pixmap, dest: Rect);
}

/// A surface backed by an in-memory pixmap.
#[derive(Clone, Debug)]
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// Create a transparent surface; `None` if either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    /// Composited pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        // Zero-sized pixmaps do not exist; keep the old store.
        if let Some(p) = Pixmap::new(width, height) {
            self.pixmap = p;
        }
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn draw_tile(&mut self, raster: &Pixmap, dest: Rect) {
        let (w, h) = (f64::from(raster.width()), f64::from(raster.height()));
        let place = Affine::translate(dest.origin().to_vec2())
            * Affine::scale_non_uniform(dest.width() / w, dest.height() / h);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, raster.as_ref(), &paint, to_transform(place), None);
    }
}

/// A surface that only records what was drawn.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    size: (u32, u32),
    /// Destination rectangle and raster size of each draw since the last clear.
    pub draws: Vec<(Rect, (u32, u32))>,
    /// Number of clears.
    pub clears: usize,
}

impl RecordingSurface {
    /// Create a recorder reporting `width × height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.draws.clear();
    }

    fn draw_tile(&mut self, raster: &Pixmap, dest: Rect) {
        self.draws.push((dest, (raster.width(), raster.height())));
    }
}
