// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Columnar (structure-of-arrays) snapshot of a flushed store.
//!
//! The snapshot is immutable and shared behind an `Arc` by the spatial index,
//! the hit tester, and every worker request. Common per-primitive fields live
//! in parallel columns indexed by [`PrimitiveId`]; kind-specific payloads live
//! in compact per-kind tables addressed by the `payload` column.

use kurbo::{Point, Rect};

use crate::primitive::{
    AtlasIndex, Color, FillMode, Interactions, LineCap, Member, Primitive, PrimitiveId,
    PrimitiveKind,
};

/// Rect payload.
#[derive(Clone, Debug, PartialEq)]
pub struct RectStyle {
    /// Interior colour.
    pub fill: Color,
    /// Outline colour.
    pub stroke: Color,
    /// Outline width (world units).
    pub stroke_width: f64,
    /// Dash pattern; empty for solid.
    pub dash: Box<[f64]>,
    /// Fill mode.
    pub mode: FillMode,
}

/// Text payload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Font size (world units).
    pub font_size: f64,
    /// Content.
    pub content: Box<str>,
    /// Glyph colour.
    pub color: Color,
}

/// Path payload.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStyle {
    /// Start point.
    pub from: Point,
    /// End point.
    pub to: Point,
    /// Stroke colour.
    pub color: Color,
    /// Stroke width; pixels when `keep_width`.
    pub width: f64,
    /// Line cap.
    pub cap: LineCap,
    /// Dash pattern; empty for solid.
    pub dash: Box<[f64]>,
    /// Width is in device pixels.
    pub keep_width: bool,
}

/// Borrowed view of one primitive inside a [`SceneColumns`].
#[derive(Copy, Clone, Debug)]
pub enum PrimitiveRef<'a> {
    /// Rectangle and its style.
    Rect {
        /// Geometry.
        rect: Rect,
        /// Style.
        style: &'a RectStyle,
    },
    /// Text box and run.
    Text {
        /// Center-anchored box.
        bounds: Rect,
        /// Run.
        run: &'a TextRun,
    },
    /// Bitmap sprite placement.
    Image {
        /// Placement.
        rect: Rect,
        /// Atlas entry.
        entry: AtlasIndex,
    },
    /// Vector icon placement.
    Icon {
        /// Placement.
        rect: Rect,
        /// Atlas entry.
        entry: AtlasIndex,
    },
    /// Line segment.
    Path(&'a PathStyle),
}

/// Frozen, columnar form of a [`GeometryStore`](crate::GeometryStore).
#[derive(Clone, Debug, Default)]
pub struct SceneColumns {
    kind: Vec<PrimitiveKind>,
    z: Vec<i32>,
    opacity: Vec<f32>,
    interactions: Vec<Interactions>,
    min_x: Vec<f64>,
    min_y: Vec<f64>,
    max_x: Vec<f64>,
    max_y: Vec<f64>,
    stroke: Vec<f64>,
    keep_width: Vec<bool>,
    payload: Vec<u32>,
    rects: Vec<RectStyle>,
    texts: Vec<TextRun>,
    sprites: Vec<AtlasIndex>,
    paths: Vec<PathStyle>,
    z_order: Vec<PrimitiveId>,
    boundary: Rect,
}

impl SceneColumns {
    /// Build the snapshot from primitives in id order.
    pub(crate) fn build(primitives: &[Primitive], boundary: Rect) -> Self {
        let n = primitives.len();
        let mut cols = Self {
            kind: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            opacity: Vec::with_capacity(n),
            interactions: Vec::with_capacity(n),
            min_x: Vec::with_capacity(n),
            min_y: Vec::with_capacity(n),
            max_x: Vec::with_capacity(n),
            max_y: Vec::with_capacity(n),
            stroke: Vec::with_capacity(n),
            keep_width: Vec::with_capacity(n),
            payload: Vec::with_capacity(n),
            boundary,
            ..Self::default()
        };
        for p in primitives {
            let b = p.base_bounds();
            let (stroke, keep_width) = p.stroke_extent();
            cols.kind.push(p.kind());
            cols.z.push(p.z());
            cols.opacity.push(p.opacity());
            cols.interactions.push(p.interactions());
            cols.min_x.push(b.x0);
            cols.min_y.push(b.y0);
            cols.max_x.push(b.x1);
            cols.max_y.push(b.y1);
            cols.stroke.push(stroke);
            cols.keep_width.push(keep_width);
            let slot = match p {
                Primitive::Rect(r) => push(
                    &mut cols.rects,
                    RectStyle {
                        fill: r.fill,
                        stroke: r.stroke,
                        stroke_width: r.stroke_width,
                        dash: r.dash.clone().into_boxed_slice(),
                        mode: r.mode,
                    },
                ),
                Primitive::Text(t) => push(
                    &mut cols.texts,
                    TextRun {
                        font_size: t.font_size,
                        content: t.content.as_str().into(),
                        color: t.color,
                    },
                ),
                Primitive::Image(s) | Primitive::Icon(s) => push(&mut cols.sprites, s.entry),
                Primitive::Path(l) => push(
                    &mut cols.paths,
                    PathStyle {
                        from: l.from,
                        to: l.to,
                        color: l.color,
                        width: l.width,
                        cap: l.cap,
                        dash: l.dash.clone().into_boxed_slice(),
                        keep_width: l.keep_width,
                    },
                ),
            };
            cols.payload.push(slot);
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "The store refuses to grow past u32::MAX primitives."
        )]
        let mut order: Vec<PrimitiveId> = (0..n).map(|i| PrimitiveId(i as u32)).collect();
        order.sort_by_key(|id| (cols.z[id.idx()], *id));
        cols.z_order = order;
        cols
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.kind.len()
    }

    /// True if the snapshot has no primitives.
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }

    /// Padded rectangle enclosing every primitive.
    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    /// All ids sorted by `(z, id)`, bottom-most first.
    pub fn z_order(&self) -> &[PrimitiveId] {
        &self.z_order
    }

    /// Members in z order.
    pub fn members(&self) -> impl Iterator<Item = Member> + '_ {
        self.z_order.iter().map(|&id| Member::new(self.kind[id.idx()], id))
    }

    /// Kind of `id`, if it exists.
    pub fn kind(&self, id: PrimitiveId) -> Option<PrimitiveKind> {
        self.kind.get(id.idx()).copied()
    }

    /// Member entry for `id`, if it exists.
    pub fn member(&self, id: PrimitiveId) -> Option<Member> {
        self.kind(id).map(|k| Member::new(k, id))
    }

    /// Stacking order of `id`.
    pub fn z(&self, id: PrimitiveId) -> i32 {
        self.z[id.idx()]
    }

    /// Opacity of `id`.
    pub fn opacity(&self, id: PrimitiveId) -> f32 {
        self.opacity[id.idx()]
    }

    /// Declared interaction capabilities of `id`.
    pub fn interactions(&self, id: PrimitiveId) -> Interactions {
        self.interactions[id.idx()]
    }

    /// Geometry before stroke extension.
    pub fn base_bounds(&self, id: PrimitiveId) -> Rect {
        let i = id.idx();
        Rect::new(self.min_x[i], self.min_y[i], self.max_x[i], self.max_y[i])
    }

    /// Type-adjusted bounds.
    ///
    /// Stroked rects and paths extend by half their stroke width. For
    /// kept-width paths the width is in pixels and `world_per_pixel` converts
    /// it to world units for the context asking (a tile raster or the screen).
    pub fn bounds(&self, id: PrimitiveId, world_per_pixel: f64) -> Rect {
        let i = id.idx();
        let width = if self.keep_width[i] {
            self.stroke[i] * world_per_pixel
        } else {
            self.stroke[i]
        };
        let half = 0.5 * width;
        self.base_bounds(id).inflate(half, half)
    }

    /// Borrow the kind-specific view of `id`.
    pub fn get(&self, id: PrimitiveId) -> Option<PrimitiveRef<'_>> {
        let i = id.idx();
        let kind = *self.kind.get(i)?;
        let slot = self.payload[i] as usize;
        Some(match kind {
            PrimitiveKind::Rect => PrimitiveRef::Rect {
                rect: self.base_bounds(id),
                style: &self.rects[slot],
            },
            PrimitiveKind::Text => PrimitiveRef::Text {
                bounds: self.base_bounds(id),
                run: &self.texts[slot],
            },
            PrimitiveKind::Image => PrimitiveRef::Image {
                rect: self.base_bounds(id),
                entry: self.sprites[slot],
            },
            PrimitiveKind::Icon => PrimitiveRef::Icon {
                rect: self.base_bounds(id),
                entry: self.sprites[slot],
            },
            PrimitiveKind::Path => PrimitiveRef::Path(&self.paths[slot]),
        })
    }
}

fn push<T>(table: &mut Vec<T>, value: T) -> u32 {
    table.push(value);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Payload tables are bounded by the primitive count."
    )]
    let slot = (table.len() - 1) as u32;
    slot
}
