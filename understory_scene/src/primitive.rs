// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive value types: colours, styles, interaction capabilities, and the
//! tagged [`Primitive`] union accepted by the [`GeometryStore`](crate::GeometryStore).

use kurbo::{Point, Rect, Size};

use crate::error::GeometryError;

/// Stable identifier of a primitive.
///
/// Ids are dense and assigned in insertion order by
/// [`GeometryStore`](crate::GeometryStore); they index straight into the
/// columns of a [`SceneColumns`](crate::SceneColumns) snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimitiveId(pub u32);

impl PrimitiveId {
    /// Index into the snapshot columns.
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Discriminant of a [`Primitive`], carried next to ids in membership lists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveKind {
    /// Filled and/or stroked rectangle.
    Rect,
    /// Center-anchored text run.
    Text,
    /// Bitmap sprite from the atlas.
    Image,
    /// Single line segment.
    Path,
    /// Vector icon from the atlas.
    Icon,
}

/// A `(kind, id)` pair as stored in tile membership lists and dirty queues.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    /// Primitive id.
    pub id: PrimitiveId,
    /// Primitive kind.
    pub kind: PrimitiveKind,
}

impl Member {
    /// Create a member entry.
    pub const fn new(kind: PrimitiveKind, id: PrimitiveId) -> Self {
        Self { id, kind }
    }
}

/// Index of an entry in the shared icon/sprite atlas.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtlasIndex(pub u32);

/// Straight-alpha 8-bit RGBA colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque colour from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour from components including alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// How a [`RectPrimitive`] is painted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillMode {
    /// Interior only.
    #[default]
    Fill,
    /// Outline only.
    Stroke,
    /// Interior, then outline.
    FillAndStroke,
}

impl FillMode {
    /// Whether the mode paints an outline (and so widens the bounds).
    pub const fn strokes(self) -> bool {
        matches!(self, Self::Stroke | Self::FillAndStroke)
    }

    /// Whether the mode paints the interior.
    pub const fn fills(self) -> bool {
        matches!(self, Self::Fill | Self::FillAndStroke)
    }
}

/// Line cap of a [`PathPrimitive`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    /// Flat cap ending at the endpoint.
    #[default]
    Butt,
    /// Half-disc cap.
    Round,
    /// Half-square cap.
    Square,
}

bitflags::bitflags! {
    /// Interaction capabilities of a primitive.
    ///
    /// Each bit is bound to a handler registered with the owning scene; only
    /// primitives carrying the matching bit take part in hit testing for that
    /// interaction.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Interactions: u8 {
        /// Receives hover enter/leave.
        const HOVER        = 0b0000_0001;
        /// Receives primary clicks.
        const CLICK        = 0b0000_0010;
        /// Receives secondary clicks.
        const RIGHT_CLICK  = 0b0000_0100;
        /// Receives double clicks.
        const DOUBLE_CLICK = 0b0000_1000;
    }
}

/// A rectangle with fill and/or stroke.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RectPrimitive {
    /// World-space rectangle.
    pub rect: Rect,
    /// Interior colour.
    pub fill: Color,
    /// Outline colour.
    pub stroke: Color,
    /// Outline width in world units.
    pub stroke_width: f64,
    /// Dash pattern for the outline; empty means solid.
    pub dash: Vec<f64>,
    /// Which parts are painted.
    pub mode: FillMode,
    /// Stacking order; higher is painted later (on top).
    pub z: i32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Interaction capabilities.
    pub interactions: Interactions,
}

impl Default for RectPrimitive {
    fn default() -> Self {
        Self {
            rect: Rect::ZERO,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            stroke_width: 0.0,
            dash: Vec::new(),
            mode: FillMode::Fill,
            z: 0,
            opacity: 1.0,
            interactions: Interactions::empty(),
        }
    }
}

/// A text run anchored at its center.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextPrimitive {
    /// Center of the text box in world space.
    pub center: Point,
    /// Extent of the text box in world units.
    pub size: Size,
    /// Font size in world units.
    pub font_size: f64,
    /// Text content.
    pub content: String,
    /// Glyph colour.
    pub color: Color,
    /// Stacking order.
    pub z: i32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Interaction capabilities.
    pub interactions: Interactions,
}

impl Default for TextPrimitive {
    fn default() -> Self {
        Self {
            center: Point::ORIGIN,
            size: Size::ZERO,
            font_size: 12.0,
            content: String::new(),
            color: Color::BLACK,
            z: 0,
            opacity: 1.0,
            interactions: Interactions::empty(),
        }
    }
}

/// A bitmap sprite or vector icon drawn from the shared atlas.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpritePrimitive {
    /// World-space placement; the sprite is drawn at this position and size.
    pub rect: Rect,
    /// Atlas entry.
    pub entry: AtlasIndex,
    /// Stacking order.
    pub z: i32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Interaction capabilities.
    pub interactions: Interactions,
}

impl Default for SpritePrimitive {
    fn default() -> Self {
        Self {
            rect: Rect::ZERO,
            entry: AtlasIndex(0),
            z: 0,
            opacity: 1.0,
            interactions: Interactions::empty(),
        }
    }
}

/// A single stroked line segment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPrimitive {
    /// Start point.
    pub from: Point,
    /// End point.
    pub to: Point,
    /// Stroke colour.
    pub color: Color,
    /// Stroke width: world units, or device pixels when `keep_width` is set.
    pub width: f64,
    /// Line cap.
    pub cap: LineCap,
    /// Dash pattern; empty means solid.
    pub dash: Vec<f64>,
    /// Interpret `width` in device pixels instead of world units.
    pub keep_width: bool,
    /// Stacking order.
    pub z: i32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Interaction capabilities.
    pub interactions: Interactions,
}

impl Default for PathPrimitive {
    fn default() -> Self {
        Self {
            from: Point::ORIGIN,
            to: Point::ORIGIN,
            color: Color::BLACK,
            width: 1.0,
            cap: LineCap::Butt,
            dash: Vec::new(),
            keep_width: false,
            z: 0,
            opacity: 1.0,
            interactions: Interactions::empty(),
        }
    }
}

/// Tagged union of every primitive the store accepts.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    /// See [`RectPrimitive`].
    Rect(RectPrimitive),
    /// See [`TextPrimitive`].
    Text(TextPrimitive),
    /// Bitmap sprite; see [`SpritePrimitive`].
    Image(SpritePrimitive),
    /// See [`PathPrimitive`].
    Path(PathPrimitive),
    /// Vector icon; see [`SpritePrimitive`].
    Icon(SpritePrimitive),
}

impl Primitive {
    /// The kind discriminant.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Rect(_) => PrimitiveKind::Rect,
            Self::Text(_) => PrimitiveKind::Text,
            Self::Image(_) => PrimitiveKind::Image,
            Self::Path(_) => PrimitiveKind::Path,
            Self::Icon(_) => PrimitiveKind::Icon,
        }
    }

    /// Stacking order.
    pub fn z(&self) -> i32 {
        match self {
            Self::Rect(p) => p.z,
            Self::Text(p) => p.z,
            Self::Image(p) | Self::Icon(p) => p.z,
            Self::Path(p) => p.z,
        }
    }

    /// Opacity.
    pub fn opacity(&self) -> f32 {
        match self {
            Self::Rect(p) => p.opacity,
            Self::Text(p) => p.opacity,
            Self::Image(p) | Self::Icon(p) => p.opacity,
            Self::Path(p) => p.opacity,
        }
    }

    /// Interaction capabilities.
    pub fn interactions(&self) -> Interactions {
        match self {
            Self::Rect(p) => p.interactions,
            Self::Text(p) => p.interactions,
            Self::Image(p) | Self::Icon(p) => p.interactions,
            Self::Path(p) => p.interactions,
        }
    }

    /// Geometric bounds before any stroke extension.
    pub fn base_bounds(&self) -> Rect {
        match self {
            Self::Rect(p) => p.rect.abs(),
            Self::Text(p) => Rect::from_center_size(p.center, p.size),
            Self::Image(p) | Self::Icon(p) => p.rect.abs(),
            Self::Path(p) => Rect::from_points(p.from, p.to),
        }
    }

    /// Stroke width that extends the bounds, and whether it is in pixels.
    pub fn stroke_extent(&self) -> (f64, bool) {
        match self {
            Self::Rect(p) if p.mode.strokes() => (p.stroke_width, false),
            Self::Path(p) => (p.width, p.keep_width),
            _ => (0.0, false),
        }
    }

    /// Check every field for shape and range errors.
    pub fn validate(&self) -> Result<(), GeometryError> {
        opacity(self.opacity())?;
        match self {
            Self::Rect(p) => {
                rect("rect", p.rect)?;
                non_negative("stroke width", p.stroke_width)?;
                dash(&p.dash)
            }
            Self::Text(p) => {
                finite("center", p.center.x)?;
                finite("center", p.center.y)?;
                non_negative("width", p.size.width)?;
                non_negative("height", p.size.height)?;
                if !(p.font_size.is_finite() && p.font_size > 0.0) {
                    return Err(GeometryError::FontSize(p.font_size));
                }
                Ok(())
            }
            Self::Image(p) | Self::Icon(p) => rect("rect", p.rect),
            Self::Path(p) => {
                finite("from", p.from.x)?;
                finite("from", p.from.y)?;
                finite("to", p.to.x)?;
                finite("to", p.to.y)?;
                non_negative("stroke width", p.width)?;
                dash(&p.dash)
            }
        }
    }
}

impl From<RectPrimitive> for Primitive {
    fn from(p: RectPrimitive) -> Self {
        Self::Rect(p)
    }
}

impl From<TextPrimitive> for Primitive {
    fn from(p: TextPrimitive) -> Self {
        Self::Text(p)
    }
}

impl From<PathPrimitive> for Primitive {
    fn from(p: PathPrimitive) -> Self {
        Self::Path(p)
    }
}

fn finite(field: &'static str, v: f64) -> Result<(), GeometryError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { field })
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), GeometryError> {
    finite(field, v)?;
    if v < 0.0 {
        return Err(GeometryError::Negative { field, value: v });
    }
    Ok(())
}

fn rect(field: &'static str, r: Rect) -> Result<(), GeometryError> {
    for v in [r.x0, r.y0, r.x1, r.y1] {
        finite(field, v)?;
    }
    non_negative("width", r.width())?;
    non_negative("height", r.height())
}

fn opacity(o: f32) -> Result<(), GeometryError> {
    if (0.0..=1.0).contains(&o) {
        Ok(())
    } else {
        Err(GeometryError::Opacity(o))
    }
}

fn dash(pattern: &[f64]) -> Result<(), GeometryError> {
    if pattern.is_empty() {
        return Ok(());
    }
    let valid = pattern.iter().all(|d| d.is_finite() && *d >= 0.0);
    if !valid || pattern.iter().sum::<f64>() <= 0.0 {
        return Err(GeometryError::Dash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroked_rect_reports_world_extent() {
        let p = Primitive::Rect(RectPrimitive {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            stroke_width: 4.0,
            mode: FillMode::FillAndStroke,
            ..Default::default()
        });
        assert_eq!(p.stroke_extent(), (4.0, false));

        let filled = Primitive::Rect(RectPrimitive {
            stroke_width: 4.0,
            ..Default::default()
        });
        assert_eq!(filled.stroke_extent(), (0.0, false));
    }

    #[test]
    fn text_bounds_are_center_anchored() {
        let p = Primitive::Text(TextPrimitive {
            center: Point::new(50.0, 20.0),
            size: Size::new(40.0, 10.0),
            content: "label".into(),
            ..Default::default()
        });
        assert_eq!(p.base_bounds(), Rect::new(30.0, 15.0, 70.0, 25.0));
    }

    #[test]
    fn path_bounds_ignore_direction() {
        let p = Primitive::Path(PathPrimitive {
            from: Point::new(10.0, 8.0),
            to: Point::new(2.0, 1.0),
            ..Default::default()
        });
        assert_eq!(p.base_bounds(), Rect::new(2.0, 1.0, 10.0, 8.0));
    }

    #[test]
    fn validation_rejects_malformed_fields() {
        let nan = Primitive::Rect(RectPrimitive {
            rect: Rect::new(f64::NAN, 0.0, 1.0, 1.0),
            ..Default::default()
        });
        assert!(matches!(
            nan.validate(),
            Err(GeometryError::NonFinite { .. })
        ));

        let inverted = Primitive::Image(SpritePrimitive {
            rect: Rect::new(10.0, 0.0, 0.0, 5.0),
            ..Default::default()
        });
        assert!(matches!(
            inverted.validate(),
            Err(GeometryError::Negative { .. })
        ));

        let faded = Primitive::Path(PathPrimitive {
            opacity: 1.5,
            ..Default::default()
        });
        assert_eq!(faded.validate(), Err(GeometryError::Opacity(1.5)));

        let dashed = Primitive::Path(PathPrimitive {
            dash: vec![0.0, 0.0],
            ..Default::default()
        });
        assert_eq!(dashed.validate(), Err(GeometryError::Dash));

        let text = Primitive::Text(TextPrimitive {
            font_size: 0.0,
            ..Default::default()
        });
        assert_eq!(text.validate(), Err(GeometryError::FontSize(0.0)));
    }
}
