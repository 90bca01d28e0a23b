// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painting primitives into tile rasters.
//!
//! Pixels relate to world coordinates by `pixel = world * scale + offset`.
//! Members are painted in the order given, which is z order.

use kurbo::{Affine, Point, Rect, Vec2};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash, Transform,
};
use understory_scene::{
    Color, Highlights, LineCap, Member, PathStyle, PrimitiveId, PrimitiveRef,
    SceneColumns, overlaps,
};

use crate::atlas::Sprite;
use crate::protocol::WorkerResources;

/// Everything needed to paint one tile.
#[derive(Copy, Clone)]
pub struct Painter<'a> {
    columns: &'a SceneColumns,
    resources: &'a WorkerResources,
    highlights: &'a Highlights,
    world_to_pixel: Affine,
    world_per_pixel: f64,
}

impl core::fmt::Debug for Painter<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Painter")
            .field("world_to_pixel", &self.world_to_pixel)
            .finish_non_exhaustive()
    }
}

impl<'a> Painter<'a> {
    /// Create a painter for a tile at `scale` pixels per world unit.
    pub fn new(
        columns: &'a SceneColumns,
        resources: &'a WorkerResources,
        highlights: &'a Highlights,
        scale: f64,
        offset: Vec2,
    ) -> Self {
        Self {
            columns,
            resources,
            highlights,
            world_to_pixel: Affine::translate(offset) * Affine::scale(scale),
            world_per_pixel: if scale > 0.0 { 1.0 / scale } else { 1.0 },
        }
    }

    /// World to pixel transform.
    pub fn world_to_pixel(&self) -> Affine {
        self.world_to_pixel
    }

    /// Paint `members` into a fresh transparent raster of `width × height`.
    ///
    /// Returns `None` for a zero-sized raster.
    pub fn render(&self, members: &[Member], width: u32, height: u32) -> Option<Pixmap> {
        let mut pixmap = Pixmap::new(width, height)?;
        for m in members {
            self.paint(&mut pixmap, m.id, None);
        }
        Some(pixmap)
    }

    /// Repaint the pixel footprint of each `dirty` primitive in place.
    ///
    /// Each footprint is cleared, then every member overlapping any footprint
    /// is repainted clipped to the footprints. Pixels outside are untouched.
    pub fn repatch(&self, pixmap: &mut Pixmap, members: &[Member], dirty: &[PrimitiveId]) {
        let full = Rect::new(0.0, 0.0, f64::from(pixmap.width()), f64::from(pixmap.height()));
        let regions: Vec<Rect> = dirty
            .iter()
            .filter(|id| id.idx() < self.columns.len())
            .map(|&id| self.pixel_bounds(id).intersect(full))
            .filter(|r| r.area() > 0.0)
            .collect();
        if regions.is_empty() {
            return;
        }
        let mut pb = PathBuilder::new();
        for r in &regions {
            if let Some(r) = to_skia_rect(*r) {
                pb.push_rect(r);
            }
        }
        let Some(clip) = pb.finish() else {
            return;
        };
        let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
            return;
        };
        mask.fill_path(&clip, FillRule::Winding, false, Transform::identity());
        let clear = Paint {
            blend_mode: BlendMode::Clear,
            ..Paint::default()
        };
        pixmap.fill_path(&clip, &clear, FillRule::Winding, Transform::identity(), None);
        for m in members {
            let b = self.pixel_bounds(m.id);
            if regions.iter().any(|r| overlaps(b, *r)) {
                self.paint(pixmap, m.id, Some(&mask));
            }
        }
    }

    /// Bounds of `id` in raster pixels, rounded outward.
    pub fn pixel_bounds(&self, id: PrimitiveId) -> Rect {
        self.world_to_pixel
            .transform_rect_bbox(self.columns.bounds(id, self.world_per_pixel))
            .expand()
    }

    fn paint(&self, pixmap: &mut Pixmap, id: PrimitiveId, mask: Option<&Mask>) {
        let Some(view) = self.columns.get(id) else {
            return;
        };
        let opacity = self.columns.opacity(id);
        let ts = to_transform(self.world_to_pixel);
        match view {
            PrimitiveRef::Rect { rect, style } => {
                let Some(r) = to_skia_rect(rect) else {
                    return;
                };
                if style.mode.fills() {
                    pixmap.fill_rect(r, &solid(style.fill, opacity), ts, mask);
                }
                if style.mode.strokes() && style.stroke_width > 0.0 {
                    let path = PathBuilder::from_rect(r);
                    let stroke = Stroke {
                        width: to_f32(style.stroke_width),
                        dash: dash(&style.dash),
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &solid(style.stroke, opacity), &stroke, ts, mask);
                }
            }
            PrimitiveRef::Text { bounds, run } => {
                self.resources.text.paint_text(
                    pixmap,
                    run,
                    bounds,
                    self.world_to_pixel,
                    opacity,
                    mask,
                );
            }
            PrimitiveRef::Image { rect, entry } | PrimitiveRef::Icon { rect, entry } => {
                let Some(entry) = self.resources.atlas.get(entry) else {
                    return;
                };
                let sprite = entry.variant(
                    self.highlights.is_hovered(id),
                    self.highlights.is_checked(id),
                );
                let to_pixel = to_transform(self.world_to_pixel * sprite.placement_transform(rect));
                match sprite {
                    Sprite::Vector { path, color, .. } => {
                        if let Some(path) = to_skia_path(path) {
                            pixmap.fill_path(
                                &path,
                                &solid(*color, opacity),
                                FillRule::Winding,
                                to_pixel,
                                mask,
                            );
                        }
                    }
                    Sprite::Bitmap(bitmap) => {
                        let paint = PixmapPaint {
                            opacity,
                            quality: FilterQuality::Bilinear,
                            ..PixmapPaint::default()
                        };
                        pixmap.draw_pixmap(0, 0, bitmap.as_ref(), &paint, to_pixel, mask);
                    }
                }
            }
            PrimitiveRef::Path(style) => self.paint_segment(pixmap, style, opacity, mask),
        }
    }

    fn paint_segment(&self, pixmap: &mut Pixmap, style: &PathStyle, opacity: f32, mask: Option<&Mask>) {
        if style.width <= 0.0 {
            return;
        }
        // Kept-width strokes are laid out in pixel space so the width is not scaled.
        let (from, to, ts) = if style.keep_width {
            (
                self.world_to_pixel * style.from,
                self.world_to_pixel * style.to,
                Transform::identity(),
            )
        } else {
            (style.from, style.to, to_transform(self.world_to_pixel))
        };
        let mut pb = PathBuilder::new();
        pb.move_to(to_f32(from.x), to_f32(from.y));
        pb.line_to(to_f32(to.x), to_f32(to.y));
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: to_f32(style.width),
            line_cap: match style.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            dash: dash(&style.dash),
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid(style.color, opacity), &stroke, ts, mask);
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "Raster coordinates are well inside f32 range."
)]
pub(crate) fn to_f32(v: f64) -> f32 {
    v as f32
}

pub(crate) fn to_transform(a: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs();
    Transform::from_row(
        to_f32(sx),
        to_f32(ky),
        to_f32(kx),
        to_f32(sy),
        to_f32(tx),
        to_f32(ty),
    )
}

pub(crate) fn to_skia_rect(r: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_ltrb(to_f32(r.x0), to_f32(r.y0), to_f32(r.x1), to_f32(r.y1))
}

pub(crate) fn solid(c: Color, opacity: f32) -> Paint<'static> {
    let mut color = tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a);
    color.apply_opacity(opacity);
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn to_skia_path(path: &kurbo::BezPath) -> Option<tiny_skia::Path> {
    let p = |pt: Point| (to_f32(pt.x), to_f32(pt.y));
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            kurbo::PathEl::MoveTo(a) => {
                let (x, y) = p(a);
                pb.move_to(x, y);
            }
            kurbo::PathEl::LineTo(a) => {
                let (x, y) = p(a);
                pb.line_to(x, y);
            }
            kurbo::PathEl::QuadTo(a, b) => {
                let ((x1, y1), (x, y)) = (p(a), p(b));
                pb.quad_to(x1, y1, x, y);
            }
            kurbo::PathEl::CurveTo(a, b, c) => {
                let ((x1, y1), (x2, y2), (x, y)) = (p(a), p(b), p(c));
                pb.cubic_to(x1, y1, x2, y2, x, y);
            }
            kurbo::PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Dash array for tiny-skia, which wants an even number of entries.
fn dash(pattern: &[f64]) -> Option<StrokeDash> {
    if pattern.is_empty() {
        return None;
    }
    let mut v: Vec<f32> = pattern.iter().map(|&d| to_f32(d)).collect();
    if v.len() % 2 == 1 {
        v.extend_from_within(..);
    }
    StrokeDash::new(v, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{Atlas, IconDef, IconSource};
    use understory_scene::{
        AtlasIndex, GeometryStore, Interactions, RectPrimitive, SpritePrimitive,
    };

    fn rgba(p: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = p.pixel(x, y).unwrap();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn two_rects() -> std::sync::Arc<SceneColumns> {
        let mut store = GeometryStore::new();
        store
            .add_rect(RectPrimitive {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                fill: Color::rgb(255, 0, 0),
                ..Default::default()
            })
            .unwrap();
        store
            .add_rect(RectPrimitive {
                rect: Rect::new(12.0, 12.0, 20.0, 20.0),
                fill: Color::rgb(0, 0, 255),
                z: 1,
                ..Default::default()
            })
            .unwrap();
        store.flush()
    }

    #[test]
    fn render_paints_members() {
        let cols = two_rects();
        let res = WorkerResources::new(Atlas::new());
        let hl = Highlights::new();
        let painter = Painter::new(&cols, &res, &hl, 1.0, Vec2::ZERO);
        let members: Vec<_> = cols.members().collect();
        let px = painter.render(&members, 20, 20).unwrap();
        assert_eq!(rgba(&px, 5, 5), [255, 0, 0, 255]);
        assert_eq!(rgba(&px, 15, 15), [0, 0, 255, 255]);
        assert_eq!(rgba(&px, 11, 5), [0, 0, 0, 0]);
        assert!(painter.render(&members, 0, 20).is_none());
    }

    #[test]
    fn offset_shifts_pixels() {
        let cols = two_rects();
        let res = WorkerResources::new(Atlas::new());
        let hl = Highlights::new();
        let painter = Painter::new(&cols, &res, &hl, 2.0, Vec2::new(-20.0, -20.0));
        let members: Vec<_> = cols.members().collect();
        let px = painter.render(&members, 20, 20).unwrap();
        assert_eq!(rgba(&px, 10, 10), [0, 0, 255, 255]);
        assert_eq!(rgba(&px, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn repatch_only_touches_dirty_footprint() {
        let cols = two_rects();
        let res = WorkerResources::new(Atlas::new());
        let hl = Highlights::new();
        let painter = Painter::new(&cols, &res, &hl, 1.0, Vec2::ZERO);
        let members: Vec<_> = cols.members().collect();
        let mut px = Pixmap::new(20, 20).unwrap();
        px.fill(tiny_skia::Color::from_rgba8(0, 255, 0, 255));
        painter.repatch(&mut px, &members, &[PrimitiveId(0)]);
        assert_eq!(rgba(&px, 5, 5), [255, 0, 0, 255]);
        assert_eq!(rgba(&px, 15, 15), [0, 255, 0, 255]);
        assert_eq!(rgba(&px, 11, 5), [0, 255, 0, 255]);
    }

    #[test]
    fn icons_swap_to_hover_variant() {
        let square = |c: Color| IconSource::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
                Point::new(0.0, 1.0),
            ],
            color: c,
        };
        let atlas = Atlas::load([(
            "box",
            IconDef {
                normal: square(Color::rgb(0, 0, 0)),
                hover: Some(square(Color::rgb(255, 255, 255))),
                checked: None,
            },
        )])
        .unwrap();
        let mut store = GeometryStore::new();
        let id = store
            .add_icon(SpritePrimitive {
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
                entry: AtlasIndex(0),
                interactions: Interactions::HOVER,
                ..Default::default()
            })
            .unwrap();
        let missing = store
            .add_icon(SpritePrimitive {
                rect: Rect::new(8.0, 8.0, 16.0, 16.0),
                entry: AtlasIndex(5),
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        let res = WorkerResources::new(atlas);
        let mut hl = Highlights::new();
        let members: Vec<_> = cols.members().collect();

        let plain = Painter::new(&cols, &res, &hl, 1.0, Vec2::ZERO)
            .render(&members, 16, 16)
            .unwrap();
        assert_eq!(rgba(&plain, 4, 4), [0, 0, 0, 255]);
        assert_eq!(rgba(&plain, 12, 12), [0, 0, 0, 0], "missing entry paints nothing");

        hl.set_hovered(id, true);
        let mut patched = plain.clone();
        Painter::new(&cols, &res, &hl, 1.0, Vec2::ZERO).repatch(&mut patched, &members, &[id, missing]);
        assert_eq!(rgba(&patched, 4, 4), [255, 255, 255, 255]);
    }

    #[test]
    fn kept_width_pixel_bounds_ignore_scale() {
        let mut store = GeometryStore::new();
        let id = store
            .add_path(understory_scene::PathPrimitive {
                from: Point::new(0.0, 10.0),
                to: Point::new(10.0, 10.0),
                width: 4.0,
                keep_width: true,
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        let res = WorkerResources::new(Atlas::new());
        let hl = Highlights::new();
        let b1 = Painter::new(&cols, &res, &hl, 1.0, Vec2::ZERO).pixel_bounds(id);
        let b4 = Painter::new(&cols, &res, &hl, 4.0, Vec2::ZERO).pixel_bounds(id);
        assert_eq!(b1.height(), 4.0);
        assert_eq!(b4.height(), 4.0);
    }
}
