// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene: primitive geometry for tiled rendering.
//!
//! - Append rectangles, text runs, sprites, line segments, and icons to a [`GeometryStore`].
//! - Every primitive is validated on entry and receives a dense, stable [`PrimitiveId`].
//! - [`GeometryStore::flush`] computes the padded world boundary and freezes the store into a
//!   columnar [`SceneColumns`] snapshot that is shared read-only by the tile index, hit testing,
//!   and rasterization workers.
//!
//! [`Highlights`] carries the hovered/checked state that interaction writes and painting reads.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_scene::{GeometryStore, RectPrimitive};
//!
//! let mut store = GeometryStore::new();
//! let id = store
//!     .add_rect(RectPrimitive {
//!         rect: Rect::new(0.0, 0.0, 100.0, 100.0),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let cols = store.flush();
//! assert_eq!(cols.boundary(), Rect::new(-2.0, -2.0, 102.0, 102.0));
//! assert_eq!(cols.z_order(), &[id]);
//! ```
//!
//! ## Bounds
//!
//! Bounds are type-adjusted: stroked rectangles and paths extend by half their stroke width.
//! Paths with `keep_width` express their width in device pixels, so their bounds depend on the
//! world-per-pixel ratio of whoever asks; see [`SceneColumns::bounds`].
//!
//! Overlap tests are half-open ([`overlaps`]), point containment is closed ([`contains`]).

pub mod bounds;
pub mod columns;
pub mod error;
pub mod highlight;
pub mod primitive;
pub mod store;

pub use bounds::{contains, overlaps, padded_union};
pub use columns::{PathStyle, PrimitiveRef, RectStyle, SceneColumns, TextRun};
pub use error::GeometryError;
pub use highlight::Highlights;
pub use primitive::{
    AtlasIndex, Color, FillMode, Interactions, LineCap, Member, PathPrimitive, Primitive,
    PrimitiveId, PrimitiveKind, RectPrimitive, SpritePrimitive, TextPrimitive,
};
pub use store::{DEFAULT_BOUNDARY_MARGIN, GeometryStore};

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Rect, Size};

    #[test]
    fn mixed_scene_snapshot_views() {
        let mut store = GeometryStore::new();
        let r = store
            .add_rect(RectPrimitive {
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                fill: Color::rgb(10, 20, 30),
                ..Default::default()
            })
            .unwrap();
        let t = store
            .add_text(TextPrimitive {
                center: Point::new(50.0, 50.0),
                size: Size::new(20.0, 10.0),
                content: "hello".into(),
                ..Default::default()
            })
            .unwrap();
        let i = store
            .add_icon(SpritePrimitive {
                rect: Rect::new(60.0, 60.0, 70.0, 70.0),
                entry: AtlasIndex(3),
                ..Default::default()
            })
            .unwrap();
        let cols = store.flush();
        assert_eq!(cols.len(), 3);
        match cols.get(r) {
            Some(PrimitiveRef::Rect { style, .. }) => assert_eq!(style.fill, Color::rgb(10, 20, 30)),
            other => panic!("unexpected {other:?}"),
        }
        match cols.get(t) {
            Some(PrimitiveRef::Text { bounds, run }) => {
                assert_eq!(bounds, Rect::new(40.0, 45.0, 60.0, 55.0));
                assert_eq!(&*run.content, "hello");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            cols.get(i),
            Some(PrimitiveRef::Icon {
                entry: AtlasIndex(3),
                ..
            })
        ));
        assert!(cols.get(PrimitiveId(9)).is_none());
    }

    #[test]
    fn interactions_are_tracked_per_primitive() {
        let mut store = GeometryStore::new();
        let id = store.add_rect(RectPrimitive::default()).unwrap();
        assert!(store.add_interactions(id, Interactions::CLICK));
        assert!(!store.add_interactions(PrimitiveId(7), Interactions::CLICK));
        let cols = store.flush();
        assert_eq!(cols.interactions(id), Interactions::CLICK);
    }
}
