// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between tile keys, world rectangles, and raster pixels.

use kurbo::{Point, Rect, Size};

use crate::level::{FAN_OUT, side_number};

/// Address of one tile: `index = row * side + col` within `level`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
    /// Level, starting at 1.
    pub level: u8,
    /// Row-major index within the level.
    pub index: u64,
}

impl TileKey {
    /// Create a key.
    pub const fn new(level: u8, index: u64) -> Self {
        Self { level, index }
    }

    /// Build a key from a column and row.
    pub const fn from_col_row(level: u8, col: u64, row: u64) -> Self {
        Self {
            level,
            index: row * side_number(level) + col,
        }
    }

    /// Column and row within the level.
    pub const fn col_row(self) -> (u64, u64) {
        let side = side_number(self.level);
        (self.index % side, self.index / side)
    }

    /// The enclosing tile one level up, or `None` at level 1.
    pub const fn parent(self) -> Option<Self> {
        if self.level <= 1 {
            return None;
        }
        let (col, row) = self.col_row();
        Some(Self::from_col_row(self.level - 1, col / FAN_OUT, row / FAN_OUT))
    }

    /// The 4×4 fan of tiles one level down.
    pub fn children(self) -> impl Iterator<Item = Self> {
        let (col, row) = self.col_row();
        let level = self.level + 1;
        (0..FAN_OUT * FAN_OUT).map(move |i| {
            Self::from_col_row(level, col * FAN_OUT + i % FAN_OUT, row * FAN_OUT + i / FAN_OUT)
        })
    }
}

/// Geometry of the tile hierarchy over one world boundary.
///
/// Every tile at every level rasterizes to at most `tile_size` pixels along
/// its longer side, so the pixel scale grows by four per level independently
/// of the output surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileGrid {
    boundary: Rect,
    tile_size: u32,
}

impl TileGrid {
    /// Create a grid over `boundary` with rasters of `tile_size` pixels.
    pub fn new(boundary: Rect, tile_size: u32) -> Self {
        Self {
            boundary,
            tile_size: tile_size.max(1),
        }
    }

    /// World boundary covered by level 1.
    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    /// Raster side length of a square cell.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// World size of one cell at `level`.
    pub fn cell_size(&self, level: u8) -> Size {
        let side = side_number(level) as f64;
        Size::new(self.boundary.width() / side, self.boundary.height() / side)
    }

    /// Pixels per world unit for rasters at `level`.
    pub fn pixel_scale(&self, level: u8) -> f64 {
        let cell = self.cell_size(level);
        let extent = cell.width.max(cell.height);
        if extent > 0.0 {
            f64::from(self.tile_size) / extent
        } else {
            1.0
        }
    }

    /// World units per raster pixel at `level`.
    pub fn world_per_pixel(&self, level: u8) -> f64 {
        1.0 / self.pixel_scale(level)
    }

    /// Raster dimensions of a tile at `level`, at least one pixel each.
    pub fn raster_size(&self, level: u8) -> (u32, u32) {
        let cell = self.cell_size(level);
        let scale = self.pixel_scale(level);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Bounded by tile_size after rounding."
        )]
        let px = |v: f64| ((v * scale).ceil() as u32).clamp(1, self.tile_size);
        (px(cell.width), px(cell.height))
    }

    /// World rectangle of `key`.
    pub fn tile_rect(&self, key: TileKey) -> Rect {
        let (col, row) = key.col_row();
        let cell = self.cell_size(key.level);
        let x0 = self.boundary.x0 + col as f64 * cell.width;
        let y0 = self.boundary.y0 + row as f64 * cell.height;
        Rect::new(x0, y0, x0 + cell.width, y0 + cell.height)
    }

    /// World extent covered by the raster of `key` at its true pixel scale.
    ///
    /// Starts at the tile origin and may overhang the tile rectangle by less
    /// than one pixel where [`raster_size`](Self::raster_size) rounded up.
    pub fn raster_rect(&self, key: TileKey) -> Rect {
        let origin = self.tile_rect(key).origin();
        let (w, h) = self.raster_size(key.level);
        let per_px = self.world_per_pixel(key.level);
        Rect::from_origin_size(origin, (f64::from(w) * per_px, f64::from(h) * per_px))
    }

    /// The tile at `level` containing world point `p`, if it lies inside the boundary.
    pub fn key_at(&self, level: u8, p: Point) -> Option<TileKey> {
        if !understory_scene::contains(self.boundary, p) {
            return None;
        }
        let cell = self.cell_size(level);
        let side = side_number(level);
        let col = cell_index(p.x - self.boundary.x0, cell.width, side);
        let row = cell_index(p.y - self.boundary.y0, cell.height, side);
        Some(TileKey::from_col_row(level, col, row))
    }

    /// Every tile at `level` overlapping world rectangle `r`, row-major.
    ///
    /// Overlap is half-open: a tile that only touches an edge of `r` is not included.
    pub fn keys_overlapping(&self, level: u8, r: Rect) -> Vec<TileKey> {
        let (b, r) = (self.boundary, r.abs());
        if b.area() <= 0.0 || !understory_scene::overlaps(r, b) {
            return Vec::new();
        }
        let cell = self.cell_size(level);
        let side = side_number(level);
        let c0 = cell_index(r.x0 - b.x0, cell.width, side);
        let c1 = last_cell_index(r.x1 - b.x0, cell.width, side);
        let r0 = cell_index(r.y0 - b.y0, cell.height, side);
        let r1 = last_cell_index(r.y1 - b.y0, cell.height, side);
        let mut keys = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                keys.push(TileKey::from_col_row(level, col, row));
            }
        }
        keys
    }
}

fn cell_index(offset: f64, cell: f64, side: u64) -> u64 {
    if cell <= 0.0 || offset <= 0.0 {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Clamped to the side length, which fits in u64."
    )]
    let i = (offset / cell).floor() as u64;
    i.min(side - 1)
}

/// Index of the last cell starting before `offset`.
fn last_cell_index(offset: f64, cell: f64, side: u64) -> u64 {
    if cell <= 0.0 || offset <= cell {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Clamped to the side length, which fits in u64."
    )]
    let i = (offset / cell).ceil() as u64;
    (i - 1).min(side - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TileGrid {
        TileGrid::new(Rect::new(-2.0, -2.0, 102.0, 102.0), 256)
    }

    #[test]
    fn level_one_splits_at_midpoint() {
        let g = grid();
        assert_eq!(
            g.tile_rect(TileKey::new(1, 0)),
            Rect::new(-2.0, -2.0, 50.0, 50.0)
        );
        assert_eq!(
            g.tile_rect(TileKey::new(1, 3)),
            Rect::new(50.0, 50.0, 102.0, 102.0)
        );
        assert_eq!(g.key_at(1, Point::new(49.0, 51.0)), Some(TileKey::new(1, 2)));
        assert_eq!(g.key_at(1, Point::new(102.0, 102.0)), Some(TileKey::new(1, 3)));
        assert_eq!(g.key_at(1, Point::new(103.0, 0.0)), None);
    }

    #[test]
    fn parent_child_round_trip() {
        let k = TileKey::from_col_row(2, 5, 6);
        assert_eq!(k.parent(), Some(TileKey::from_col_row(1, 1, 1)));
        assert_eq!(TileKey::new(1, 0).parent(), None);
        let kids: Vec<_> = k.children().collect();
        assert_eq!(kids.len(), 16);
        assert!(kids.iter().all(|c| c.parent() == Some(k)));
        let g = grid();
        let pr = g.tile_rect(k);
        for c in kids {
            let cr = g.tile_rect(c);
            assert!(cr.x0 >= pr.x0 - 1e-9 && cr.x1 <= pr.x1 + 1e-9);
            assert!(cr.y0 >= pr.y0 - 1e-9 && cr.y1 <= pr.y1 + 1e-9);
        }
    }

    #[test]
    fn pixel_scale_grows_by_four() {
        let g = grid();
        let s1 = g.pixel_scale(1);
        assert!((g.pixel_scale(2) / s1 - 4.0).abs() < 1e-9);
        assert_eq!(g.raster_size(1), (256, 256));
    }

    #[test]
    fn rasters_keep_their_pixel_scale_on_uneven_boundaries() {
        let g = TileGrid::new(Rect::new(0.0, 0.0, 300.0, 100.3), 256);
        let scale = g.pixel_scale(1);
        let (w, h) = g.raster_size(1);
        assert_eq!((w, h), (256, 86));
        let key = TileKey::new(1, 3);
        let cell = g.tile_rect(key);
        let raster = g.raster_rect(key);
        assert_eq!(raster.origin(), cell.origin());
        assert!((raster.width() * scale - f64::from(w)).abs() < 1e-9);
        assert!((raster.height() * scale - f64::from(h)).abs() < 1e-9);
        assert!(raster.height() > cell.height());
        assert!(raster.height() - cell.height() < 1.0 / scale);
    }

    #[test]
    fn overlapping_keys_are_clamped() {
        let g = grid();
        let keys = g.keys_overlapping(1, Rect::new(-1000.0, 10.0, 1000.0, 20.0));
        assert_eq!(keys, vec![TileKey::new(1, 0), TileKey::new(1, 1)]);
        assert!(g.keys_overlapping(1, Rect::new(200.0, 200.0, 300.0, 300.0)).is_empty());
        assert_eq!(g.keys_overlapping(2, g.boundary()).len(), 64);
    }

    #[test]
    fn touching_edges_do_not_pull_in_tiles() {
        let g = grid();
        assert_eq!(
            g.keys_overlapping(1, Rect::new(0.0, 0.0, 50.0, 40.0)),
            vec![TileKey::new(1, 0)]
        );
        assert_eq!(
            g.keys_overlapping(1, Rect::new(50.0, 0.0, 60.0, 10.0)),
            vec![TileKey::new(1, 1)]
        );
        assert_eq!(
            g.keys_overlapping(1, Rect::new(10.0, 10.0, 50.0, 50.0)),
            vec![TileKey::new(1, 0)]
        );
        assert!(g.keys_overlapping(1, Rect::new(102.0, 0.0, 120.0, 10.0)).is_empty());
        assert!(g.keys_overlapping(1, Rect::new(-20.0, 0.0, -2.0, 10.0)).is_empty());
    }

    #[test]
    fn empty_boundary_is_inert() {
        let g = TileGrid::new(Rect::ZERO, 256);
        assert_eq!(g.pixel_scale(1), 1.0);
        assert!(g.keys_overlapping(1, Rect::new(0.0, 0.0, 1.0, 1.0)).is_empty());
    }
}
