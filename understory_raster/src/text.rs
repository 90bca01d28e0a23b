// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text painting.
//!
//! [`ShapedTextPainter`] shapes runs with `cosmic-text` and rasterizes glyph
//! masks with swash; it is the default. [`GreekingPainter`] draws a block per
//! glyph and is meant for overview levels.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache};
use kurbo::{Affine, Rect};
use tiny_skia::{ColorU8, FillRule, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};
use understory_scene::TextRun;

use crate::paint::{solid, to_f32, to_skia_rect, to_transform};

/// Paints text runs into tile rasters.
///
/// Implementations are shared by every worker thread.
pub trait TextPainter: Send + Sync {
    /// Paint `run` centered in `bounds` (world space).
    fn paint_text(
        &self,
        pixmap: &mut Pixmap,
        run: &TextRun,
        bounds: Rect,
        world_to_pixel: Affine,
        opacity: f32,
        mask: Option<&Mask>,
    );
}

/// One font database and glyph cache; used by one worker at a time.
struct Shaper {
    fonts: FontSystem,
    glyphs: SwashCache,
}

impl Shaper {
    fn new() -> Self {
        let fonts = FontSystem::new();
        log::debug!("font system loaded {} faces", fonts.db().len());
        Self {
            fonts,
            glyphs: SwashCache::new(),
        }
    }

    fn has_fonts(&self) -> bool {
        !self.fonts.db().is_empty()
    }

    /// Shape and rasterize `run` at `size` pixels into a tight pixmap.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Line extents are small positive pixel counts."
    )]
    fn rasterize(&mut self, run: &TextRun, size: f32) -> Option<Pixmap> {
        let Self { fonts, glyphs } = self;
        let metrics = Metrics::new(size, size * ShapedTextPainter::LINE_HEIGHT);
        let mut buffer = Buffer::new(fonts, metrics);
        buffer.set_size(fonts, None, None);
        buffer.set_text(
            fonts,
            &run.content,
            Attrs::new().family(Family::SansSerif),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(fonts, false);

        let width = buffer.layout_runs().map(|l| l.line_w).fold(0.0_f32, f32::max);
        let lines = buffer.layout_runs().count();
        let height = metrics.line_height * lines as f32;
        let mut pixmap = Pixmap::new(width.ceil() as u32, height.ceil() as u32)?;

        let (w, h) = (pixmap.width() as i32, pixmap.height() as i32);
        let pixels = pixmap.pixels_mut();
        let c = run.color;
        buffer.draw(
            fonts,
            glyphs,
            cosmic_text::Color::rgba(c.r, c.g, c.b, c.a),
            |x, y, gw, gh, color| {
                if color.a() == 0 {
                    return;
                }
                let px = ColorU8::from_rgba(color.r(), color.g(), color.b(), color.a()).premultiply();
                for row in y.max(0)..(y + gh as i32).min(h) {
                    for col in x.max(0)..(x + gw as i32).min(w) {
                        let slot = &mut pixels[(row * w + col) as usize];
                        if px.alpha() > slot.alpha() {
                            *slot = px;
                        }
                    }
                }
            },
        );
        Some(pixmap)
    }
}

/// Shapes text with `cosmic-text` and draws the glyphs center-anchored.
///
/// Runs smaller than [`MIN_PIXEL_SIZE`](Self::MIN_PIXEL_SIZE) on the raster,
/// and every run when no font faces are installed, fall back to
/// [`GreekingPainter`].
///
/// Shapers are pooled: each worker borrows one for the duration of a run and
/// a new one is created when all are in use.
pub struct ShapedTextPainter {
    shapers: Mutex<Vec<Shaper>>,
}

impl fmt::Debug for ShapedTextPainter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pooled = self.shapers.lock().map_or(0, |s| s.len());
        f.debug_struct("ShapedTextPainter")
            .field("pooled", &pooled)
            .finish_non_exhaustive()
    }
}

impl Default for ShapedTextPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapedTextPainter {
    /// Below this pixel size glyphs are greeked.
    pub const MIN_PIXEL_SIZE: f64 = 4.0;
    /// Line height relative to the font size.
    pub const LINE_HEIGHT: f32 = 1.2;

    /// Create a painter over the system fonts; fonts load on first use.
    pub fn new() -> Self {
        Self {
            shapers: Mutex::new(Vec::new()),
        }
    }

    /// Whether any font face is available for shaping.
    pub fn has_fonts(&self) -> bool {
        self.with_shaper(|s| s.has_fonts())
    }

    /// Rasterize `run` at `size` pixels into a tight pixmap, without placing it.
    ///
    /// `None` if no fonts are installed or the run has no extent.
    pub fn rasterize(&self, run: &TextRun, size: f32) -> Option<Pixmap> {
        self.with_shaper(|s| if s.has_fonts() { s.rasterize(run, size) } else { None })
    }

    fn with_shaper<T>(&self, f: impl FnOnce(&mut Shaper) -> T) -> T {
        let pooled = self.shapers.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let mut shaper = pooled.unwrap_or_else(Shaper::new);
        let out = f(&mut shaper);
        self.shapers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(shaper);
        out
    }
}

impl TextPainter for ShapedTextPainter {
    fn paint_text(
        &self,
        pixmap: &mut Pixmap,
        run: &TextRun,
        bounds: Rect,
        world_to_pixel: Affine,
        opacity: f32,
        mask: Option<&Mask>,
    ) {
        let scale = world_to_pixel.as_coeffs()[0].abs();
        let size = run.font_size * scale;
        let text = if size < Self::MIN_PIXEL_SIZE {
            None
        } else {
            self.rasterize(run, to_f32(size))
        };
        let Some(text) = text else {
            GreekingPainter.paint_text(pixmap, run, bounds, world_to_pixel, opacity, mask);
            return;
        };
        let center = world_to_pixel * bounds.center();
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Pixel positions are far inside i32 range."
        )]
        let (x, y) = (
            (center.x - 0.5 * f64::from(text.width())).round() as i32,
            (center.y - 0.5 * f64::from(text.height())).round() as i32,
        );
        let paint = PixmapPaint {
            opacity,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(x, y, text.as_ref(), &paint, Transform::identity(), mask);
    }
}

/// Draws each visible glyph as a solid block, centered in the text box.
///
/// Suitable for overview levels where glyphs would be a few pixels tall.
#[derive(Copy, Clone, Debug, Default)]
pub struct GreekingPainter;

impl GreekingPainter {
    /// Advance of one glyph relative to the font size.
    pub const ADVANCE: f64 = 0.6;
    /// Block height relative to the font size.
    pub const X_HEIGHT: f64 = 0.5;

    /// World-space blocks for `run` centered in `bounds`.
    pub fn blocks(run: &TextRun, bounds: Rect) -> Vec<Rect> {
        let advance = run.font_size * Self::ADVANCE;
        let height = run.font_size * Self::X_HEIGHT;
        let count = run.content.chars().count() as f64;
        let center = bounds.center();
        let x0 = center.x - 0.5 * advance * count;
        let (y0, y1) = (center.y - 0.5 * height, center.y + 0.5 * height);
        let mut out = Vec::new();
        for (i, ch) in run.content.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = x0 + advance * i as f64;
            out.push(Rect::new(x + 0.1 * advance, y0, x + 0.9 * advance, y1));
        }
        out
    }
}

impl TextPainter for GreekingPainter {
    fn paint_text(
        &self,
        pixmap: &mut Pixmap,
        run: &TextRun,
        bounds: Rect,
        world_to_pixel: Affine,
        opacity: f32,
        mask: Option<&Mask>,
    ) {
        let mut pb = PathBuilder::new();
        for block in Self::blocks(run, bounds) {
            if let Some(r) = to_skia_rect(block) {
                pb.push_rect(r);
            }
        }
        let Some(path) = pb.finish() else {
            return;
        };
        pixmap.fill_path(
            &path,
            &solid(run.color, opacity),
            FillRule::Winding,
            to_transform(world_to_pixel),
            mask,
        );
    }
}
