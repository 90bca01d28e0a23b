// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared icon and sprite atlas.
//!
//! Sources are parsed once at load time. Each entry has a normal sprite and
//! optional hover and checked variants that painting substitutes for
//! highlighted primitives.

use std::collections::HashMap;

use kurbo::{Affine, BezPath, Point, Rect, Shape};
use tiny_skia::{ColorU8, IntSize, Pixmap};
use understory_scene::{AtlasIndex, Color};

use crate::error::AtlasError;

/// Unparsed description of one sprite.
#[derive(Clone, Debug, PartialEq)]
pub enum IconSource {
    /// SVG path data (`d` attribute syntax), filled with `color`.
    Svg {
        /// Path data.
        data: String,
        /// Fill colour.
        color: Color,
    },
    /// Closed polygon, filled with `color`.
    Polygon {
        /// Vertices in drawing order.
        points: Vec<Point>,
        /// Fill colour.
        color: Color,
    },
    /// Straight (non-premultiplied) RGBA8 pixels, row-major.
    Bitmap {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// `width * height * 4` bytes.
        rgba: Vec<u8>,
    },
}

/// One atlas entry to load: a normal source plus optional variants.
#[derive(Clone, Debug, PartialEq)]
pub struct IconDef {
    /// Drawn by default.
    pub normal: IconSource,
    /// Drawn while hovered.
    pub hover: Option<IconSource>,
    /// Drawn while checked.
    pub checked: Option<IconSource>,
}

impl From<IconSource> for IconDef {
    fn from(normal: IconSource) -> Self {
        Self {
            normal,
            hover: None,
            checked: None,
        }
    }
}

/// A parsed sprite.
#[derive(Clone, Debug)]
pub enum Sprite {
    /// Vector outline in its own coordinate space.
    Vector {
        /// Outline.
        path: BezPath,
        /// Bounding box of the outline; mapped onto the placement rectangle.
        view: Rect,
        /// Fill colour.
        color: Color,
    },
    /// Premultiplied pixels.
    Bitmap(Pixmap),
}

impl Sprite {
    fn parse(name: &str, source: &IconSource) -> Result<Self, AtlasError> {
        match source {
            IconSource::Svg { data, color } => {
                let path = BezPath::from_svg(data).map_err(|_| AtlasError::PathData {
                    name: name.to_owned(),
                })?;
                Ok(Self::vector(path, *color))
            }
            IconSource::Polygon { points, color } => {
                if points.len() < 3 {
                    return Err(AtlasError::Polygon {
                        name: name.to_owned(),
                        points: points.len(),
                    });
                }
                let mut path = BezPath::new();
                path.move_to(points[0]);
                for &p in &points[1..] {
                    path.line_to(p);
                }
                path.close_path();
                Ok(Self::vector(path, *color))
            }
            IconSource::Bitmap {
                width,
                height,
                rgba,
            } => {
                let bad = || AtlasError::Bitmap {
                    name: name.to_owned(),
                    width: *width,
                    height: *height,
                    len: rgba.len(),
                };
                let expected = (*width as usize)
                    .checked_mul(*height as usize)
                    .and_then(|n| n.checked_mul(4));
                if expected != Some(rgba.len()) {
                    return Err(bad());
                }
                let size = IntSize::from_wh(*width, *height).ok_or_else(bad)?;
                let mut data = Vec::with_capacity(rgba.len());
                for px in rgba.chunks_exact(4) {
                    let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
                    data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
                Pixmap::from_vec(data, size).map(Self::Bitmap).ok_or_else(bad)
            }
        }
    }

    fn vector(path: BezPath, color: Color) -> Self {
        let view = path.bounding_box();
        Self::Vector { path, view, color }
    }

    /// Transform from sprite space onto `placement` in world space.
    pub fn placement_transform(&self, placement: Rect) -> Affine {
        let view = match self {
            Self::Vector { view, .. } => *view,
            Self::Bitmap(p) => Rect::new(0.0, 0.0, f64::from(p.width()), f64::from(p.height())),
        };
        let sx = if view.width() > 0.0 {
            placement.width() / view.width()
        } else {
            1.0
        };
        let sy = if view.height() > 0.0 {
            placement.height() / view.height()
        } else {
            1.0
        };
        Affine::translate(placement.origin().to_vec2())
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(-view.origin().to_vec2())
    }
}

/// A loaded atlas entry.
#[derive(Clone, Debug)]
pub struct AtlasEntry {
    /// Default sprite.
    pub normal: Sprite,
    /// Hover variant.
    pub hover: Option<Sprite>,
    /// Checked variant.
    pub checked: Option<Sprite>,
}

impl AtlasEntry {
    /// The sprite for a given highlight state; hover wins over checked.
    pub fn variant(&self, hovered: bool, checked: bool) -> &Sprite {
        let pick = if hovered { self.hover.as_ref() } else { None };
        pick.or(if checked { self.checked.as_ref() } else { None })
            .unwrap_or(&self.normal)
    }
}

/// Named collection of sprites indexed by [`AtlasIndex`].
#[derive(Clone, Debug, Default)]
pub struct Atlas {
    entries: Vec<AtlasEntry>,
    names: HashMap<String, AtlasIndex>,
}

impl Atlas {
    /// Create an empty atlas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every definition, assigning indices in iteration order.
    pub fn load<I, S>(defs: I) -> Result<Self, AtlasError>
    where
        I: IntoIterator<Item = (S, IconDef)>,
        S: Into<String>,
    {
        let mut atlas = Self::new();
        for (name, def) in defs {
            atlas.insert(name, &def)?;
        }
        log::debug!("atlas loaded with {} entries", atlas.len());
        Ok(atlas)
    }

    /// Parse and append one definition.
    pub fn insert(&mut self, name: impl Into<String>, def: &IconDef) -> Result<AtlasIndex, AtlasError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(AtlasError::Duplicate(name));
        }
        let variant = |s: &Option<IconSource>| s.as_ref().map(|s| Sprite::parse(&name, s)).transpose();
        let entry = AtlasEntry {
            normal: Sprite::parse(&name, &def.normal)?,
            hover: variant(&def.hover)?,
            checked: variant(&def.checked)?,
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Atlases hold far fewer than u32::MAX entries."
        )]
        let index = AtlasIndex(self.entries.len() as u32);
        self.entries.push(entry);
        self.names.insert(name, index);
        Ok(index)
    }

    /// Index of a named entry.
    pub fn index_of(&self, name: &str) -> Option<AtlasIndex> {
        self.names.get(name).copied()
    }

    /// Borrow an entry; `None` for unknown indices.
    pub fn get(&self, index: AtlasIndex) -> Option<&AtlasEntry> {
        self.entries.get(index.0 as usize)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the atlas has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
