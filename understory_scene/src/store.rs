// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The mutable geometry store and its flush step.

use std::sync::Arc;

use kurbo::Rect;

use crate::bounds::padded_union;
use crate::columns::SceneColumns;
use crate::error::GeometryError;
use crate::primitive::{
    Interactions, PathPrimitive, Primitive, PrimitiveId, RectPrimitive, SpritePrimitive,
    TextPrimitive,
};

/// Margin added around the union of all primitive bounds.
pub const DEFAULT_BOUNDARY_MARGIN: f64 = 2.0;

/// Owner of every primitive in a scene.
///
/// Primitives are appended with the `add_*` methods, which validate input and
/// assign dense, stable ids. [`GeometryStore::flush`] freezes the current
/// contents into an immutable [`SceneColumns`] snapshot and computes the world
/// boundary that all tile coordinates are relative to.
#[derive(Clone, Debug)]
pub struct GeometryStore {
    primitives: Vec<Primitive>,
    margin: f64,
    dirty: bool,
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryStore {
    /// Create an empty store with the default boundary margin.
    pub fn new() -> Self {
        Self::with_margin(DEFAULT_BOUNDARY_MARGIN)
    }

    /// Create an empty store with an explicit boundary margin.
    pub fn with_margin(margin: f64) -> Self {
        Self {
            primitives: Vec::new(),
            margin,
            dirty: true,
        }
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// True if the store holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Whether primitives were added or changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Validate and append a primitive.
    pub fn add(&mut self, primitive: impl Into<Primitive>) -> Result<PrimitiveId, GeometryError> {
        let primitive = primitive.into();
        primitive.validate()?;
        let id = u32::try_from(self.primitives.len())
            .map_err(|_| GeometryError::IdSpaceExhausted)?;
        self.primitives.push(primitive);
        self.dirty = true;
        Ok(PrimitiveId(id))
    }

    /// Append a rectangle.
    pub fn add_rect(&mut self, rect: RectPrimitive) -> Result<PrimitiveId, GeometryError> {
        self.add(Primitive::Rect(rect))
    }

    /// Append a text run.
    pub fn add_text(&mut self, text: TextPrimitive) -> Result<PrimitiveId, GeometryError> {
        self.add(Primitive::Text(text))
    }

    /// Append a bitmap sprite.
    pub fn add_image(&mut self, image: SpritePrimitive) -> Result<PrimitiveId, GeometryError> {
        self.add(Primitive::Image(image))
    }

    /// Append a line segment.
    pub fn add_path(&mut self, path: PathPrimitive) -> Result<PrimitiveId, GeometryError> {
        self.add(Primitive::Path(path))
    }

    /// Append a vector icon.
    pub fn add_icon(&mut self, icon: SpritePrimitive) -> Result<PrimitiveId, GeometryError> {
        self.add(Primitive::Icon(icon))
    }

    /// Borrow a primitive.
    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id.idx())
    }

    /// Add interaction capabilities to an existing primitive.
    ///
    /// Returns false if `id` does not exist.
    pub fn add_interactions(&mut self, id: PrimitiveId, flags: Interactions) -> bool {
        let Some(p) = self.primitives.get_mut(id.idx()) else {
            return false;
        };
        let slot = match p {
            Primitive::Rect(r) => &mut r.interactions,
            Primitive::Text(t) => &mut t.interactions,
            Primitive::Image(s) | Primitive::Icon(s) => &mut s.interactions,
            Primitive::Path(l) => &mut l.interactions,
        };
        if !slot.contains(flags) {
            *slot |= flags;
            self.dirty = true;
        }
        true
    }

    /// World boundary of the current contents.
    ///
    /// Union of every primitive's type-adjusted bounds, padded by the margin.
    /// Kept-width paths contribute their geometry only, since their pixel
    /// width has no world extent until a scale is known. An empty store yields
    /// [`Rect::ZERO`].
    pub fn boundary(&self) -> Rect {
        padded_union(
            self.primitives.iter().map(|p| {
                let (stroke, keep_width) = p.stroke_extent();
                let half = if keep_width { 0.0 } else { 0.5 * stroke };
                p.base_bounds().inflate(half, half)
            }),
            self.margin,
        )
    }

    /// Freeze the store into a shareable columnar snapshot.
    ///
    /// Flushing unchanged geometry twice produces identical snapshots.
    pub fn flush(&mut self) -> Arc<SceneColumns> {
        let boundary = self.boundary();
        log::debug!(
            "flushing {} primitives, boundary {:?}",
            self.primitives.len(),
            boundary
        );
        self.dirty = false;
        Arc::new(SceneColumns::build(&self.primitives, boundary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Color, FillMode, PrimitiveKind};
    use kurbo::Point;

    #[test]
    fn single_rect_boundary_is_padded() {
        let mut store = GeometryStore::new();
        store
            .add_rect(RectPrimitive {
                rect: Rect::new(0.0, 0.0, 100.0, 100.0),
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        assert_eq!(cols.boundary(), Rect::new(-2.0, -2.0, 102.0, 102.0));
    }

    #[test]
    fn empty_store_boundary_is_zero() {
        let mut store = GeometryStore::new();
        let cols = store.flush();
        assert!(cols.is_empty());
        assert_eq!(cols.boundary(), Rect::ZERO);
    }

    #[test]
    fn rejected_primitive_is_not_added() {
        let mut store = GeometryStore::new();
        let err = store.add_path(PathPrimitive {
            width: -1.0,
            ..Default::default()
        });
        assert!(err.is_err());
        assert!(store.is_empty());
        let ok = store
            .add_path(PathPrimitive {
                to: Point::new(5.0, 5.0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ok, PrimitiveId(0));
    }

    #[test]
    fn stroke_widens_boundary_and_bounds() {
        let mut store = GeometryStore::with_margin(0.0);
        let id = store
            .add_rect(RectPrimitive {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                stroke_width: 2.0,
                mode: FillMode::Stroke,
                stroke: Color::rgb(255, 0, 0),
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        assert_eq!(cols.boundary(), Rect::new(-1.0, -1.0, 11.0, 11.0));
        assert_eq!(cols.bounds(id, 1.0), Rect::new(-1.0, -1.0, 11.0, 11.0));
    }

    #[test]
    fn kept_width_bounds_scale_with_context() {
        let mut store = GeometryStore::with_margin(0.0);
        let id = store
            .add_path(PathPrimitive {
                from: Point::new(0.0, 5.0),
                to: Point::new(10.0, 5.0),
                width: 4.0,
                keep_width: true,
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        assert_eq!(cols.bounds(id, 0.5), Rect::new(-1.0, 4.0, 11.0, 6.0));
        assert_eq!(cols.bounds(id, 0.25), Rect::new(-0.5, 4.5, 10.5, 5.5));
    }

    #[test]
    fn z_order_sorts_by_z_then_id() {
        let mut store = GeometryStore::new();
        let a = store
            .add_rect(RectPrimitive {
                z: 5,
                ..Default::default()
            })
            .unwrap();
        let b = store
            .add_text(TextPrimitive {
                z: -1,
                ..Default::default()
            })
            .unwrap();
        let c = store
            .add_rect(RectPrimitive {
                z: 5,
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        assert_eq!(cols.z_order(), &[b, a, c]);
        assert_eq!(cols.kind(b), Some(PrimitiveKind::Text));
    }

    #[test]
    fn flush_is_idempotent() {
        let mut store = GeometryStore::new();
        for i in 0..8 {
            let x = f64::from(i) * 13.0;
            store
                .add_rect(RectPrimitive {
                    rect: Rect::new(x, x, x + 20.0, x + 5.0),
                    z: 8 - i,
                    ..Default::default()
                })
                .unwrap();
        }
        let first = store.flush();
        let second = store.flush();
        assert_eq!(first.boundary(), second.boundary());
        assert_eq!(first.z_order(), second.z_order());
    }
}
