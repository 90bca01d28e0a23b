// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! World ↔ screen mapping.
//!
//! `screen = offset + k * base * (world - boundary.origin)`, where `base` fits
//! the world boundary into the surface and `k` is the user zoom factor.

use kurbo::{Point, Rect, Vec2};

/// Scale that fits `boundary` inside a `width × height` surface.
///
/// Degenerate boundaries or surfaces yield 1.
pub fn fit_scale(boundary: Rect, width: u32, height: u32) -> f64 {
    let (bw, bh) = (boundary.width(), boundary.height());
    if bw <= 0.0 || bh <= 0.0 || width == 0 || height == 0 {
        return 1.0;
    }
    (f64::from(width) / bw).min(f64::from(height) / bh)
}

/// Pan offset, zoom factor, and fit scale.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewTransform {
    /// Screen position of the boundary origin.
    pub offset: Vec2,
    /// User zoom factor; 1 shows the whole boundary.
    pub k: f64,
    /// Fit scale from [`fit_scale`].
    pub base: f64,
    /// World origin (the boundary's min corner).
    pub origin: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            k: 1.0,
            base: 1.0,
            origin: Point::ORIGIN,
        }
    }
}

impl ViewTransform {
    /// Screen pixels per world unit.
    pub fn pixels_per_unit(&self) -> f64 {
        self.k * self.base
    }

    /// World units per screen pixel.
    pub fn world_per_pixel(&self) -> f64 {
        let s = self.pixels_per_unit();
        if s > 0.0 { 1.0 / s } else { 1.0 }
    }

    /// Map a world point to the screen.
    pub fn world_to_screen(&self, p: Point) -> Point {
        (self.offset + (p - self.origin) * self.pixels_per_unit()).to_point()
    }

    /// Map a screen point to the world.
    pub fn screen_to_world(&self, p: Point) -> Point {
        self.origin + (p.to_vec2() - self.offset) * self.world_per_pixel()
    }

    /// Map a world rectangle to the screen.
    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        Rect::from_points(
            self.world_to_screen(r.origin()),
            self.world_to_screen(Point::new(r.x1, r.y1)),
        )
    }

    /// World rectangle visible on a `width × height` surface.
    pub fn visible_world(&self, width: u32, height: u32) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ORIGIN),
            self.screen_to_world(Point::new(f64::from(width), f64::from(height))),
        )
    }

    /// Zoom by `ratio` keeping the world point under `cursor` fixed.
    pub fn zoom_about(&mut self, cursor: Point, ratio: f64) {
        let c = cursor.to_vec2();
        self.offset = c - (c - self.offset) * ratio;
        self.k *= ratio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_uses_tighter_axis() {
        let b = Rect::new(-2.0, -2.0, 102.0, 102.0);
        assert_eq!(fit_scale(b, 208, 520), 2.0);
        assert_eq!(fit_scale(Rect::ZERO, 100, 100), 1.0);
    }

    #[test]
    fn mapping_round_trips() {
        let t = ViewTransform {
            offset: Vec2::new(10.0, 20.0),
            k: 2.0,
            base: 3.0,
            origin: Point::new(-2.0, -2.0),
        };
        let w = Point::new(5.0, 7.0);
        let s = t.world_to_screen(w);
        assert_eq!(s, Point::new(10.0 + 6.0 * 7.0, 20.0 + 6.0 * 9.0));
        let back = t.screen_to_world(s);
        assert!((back - w).hypot() < 1e-9);
    }

    #[test]
    fn zoom_keeps_cursor_fixed() {
        let mut t = ViewTransform {
            base: 2.0,
            ..ViewTransform::default()
        };
        let cursor = Point::new(40.0, 30.0);
        let before = t.screen_to_world(cursor);
        t.zoom_about(cursor, 1.1);
        let after = t.screen_to_world(cursor);
        assert!((before - after).hypot() < 1e-9);
        assert!((t.k - 1.1).abs() < 1e-12);
    }
}
