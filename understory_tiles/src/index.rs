// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tile arena: lazy membership refinement and render bookkeeping.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use understory_scene::{Member, PrimitiveId, SceneColumns, overlaps};

use crate::grid::{TileGrid, TileKey};
use crate::level::{DEFAULT_MAX_LEVEL, tile_count};
use crate::tile::{Tile, TileId, TileState};

/// Deepest level any index accepts; keeps tile indices inside `u64`.
pub const LEVEL_LIMIT: u8 = 16;

/// Result of applying a completion to its tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The raster was stored.
    Applied,
    /// The tile's level is no longer active; the tile is Unrendered again.
    Stale,
    /// Rasters were invalidated while the request was in flight; the tile is
    /// Unrendered again.
    Invalidated,
}

/// What a RePatch needs: the current raster and the dirty primitives.
#[derive(Clone)]
pub struct PatchTicket<R> {
    /// Raster to patch.
    pub raster: Arc<R>,
    /// Deduplicated dirty ids, ascending.
    pub dirty: Vec<PrimitiveId>,
}

impl<R> fmt::Debug for PatchTicket<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchTicket")
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Multi-resolution spatial index over one flushed scene.
///
/// Tiles are created on first access and never removed; a new flush builds a
/// new index. Level-1 tiles scan the whole scene, deeper tiles narrow their
/// parent's membership, so a child's members are always a subset of its
/// parent's.
///
/// `R` is the raster type cached per tile.
pub struct SpatialIndex<R> {
    columns: Arc<SceneColumns>,
    grid: TileGrid,
    max_level: u8,
    tiles: Vec<Tile<R>>,
    by_key: HashMap<TileKey, TileId>,
}

impl<R> fmt::Debug for SpatialIndex<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("grid", &self.grid)
            .field("max_level", &self.max_level)
            .field("primitives", &self.columns.len())
            .field("tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}

impl<R> SpatialIndex<R> {
    /// Create an index over `columns` with rasters of `tile_size` pixels and
    /// the default maximum level.
    pub fn new(columns: Arc<SceneColumns>, tile_size: u32) -> Self {
        Self::with_max_level(columns, tile_size, DEFAULT_MAX_LEVEL)
    }

    /// Create an index with an explicit maximum level, clamped to `1..=LEVEL_LIMIT`.
    pub fn with_max_level(columns: Arc<SceneColumns>, tile_size: u32, max_level: u8) -> Self {
        let grid = TileGrid::new(columns.boundary(), tile_size);
        Self {
            columns,
            grid,
            max_level: max_level.clamp(1, LEVEL_LIMIT),
            tiles: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    /// Scene snapshot the index was built over.
    pub fn columns(&self) -> &Arc<SceneColumns> {
        &self.columns
    }

    /// Tile geometry.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Deepest level served.
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Number of materialized tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True if no tile has been materialized.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Borrow a tile.
    ///
    /// # Panics
    ///
    /// If `id` was not issued by this index.
    pub fn tile(&self, id: TileId) -> &Tile<R> {
        &self.tiles[id.idx()]
    }

    /// All materialized tiles in creation order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile<R>)> + '_ {
        self.tiles.iter().enumerate().map(|(i, t)| (tile_id(i), t))
    }

    /// Handle of an already materialized tile.
    pub fn lookup(&self, key: TileKey) -> Option<TileId> {
        self.by_key.get(&key).copied()
    }

    /// Number of tiles with a request in flight.
    pub fn in_flight(&self) -> usize {
        self.tiles.iter().filter(|t| t.locked).count()
    }

    /// Resolve `(level, index)`, building it and any missing ancestors.
    ///
    /// Returns `None` when the level is outside `1..=max_level` or the index
    /// is outside the level.
    pub fn get_tile(&mut self, level: u8, index: u64) -> Option<TileId> {
        if level < 1 || level > self.max_level || index >= tile_count(level) {
            return None;
        }
        let key = TileKey::new(level, index);
        if let Some(id) = self.lookup(key) {
            return Some(id);
        }
        let mut pending = vec![key];
        let mut parent = None;
        let mut cursor = key;
        while let Some(up) = cursor.parent() {
            if let Some(id) = self.lookup(up) {
                parent = Some(id);
                break;
            }
            pending.push(up);
            cursor = up;
        }
        while let Some(k) = pending.pop() {
            parent = Some(self.materialize(k, parent));
        }
        parent
    }

    /// [`get_tile`](Self::get_tile) by key.
    pub fn get_tile_by_key(&mut self, key: TileKey) -> Option<TileId> {
        self.get_tile(key.level, key.index)
    }

    /// Every materialized tile whose membership lists `id`.
    pub fn find_tiles_containing(&self, id: PrimitiveId) -> Vec<TileId> {
        self.tiles()
            .filter(|(_, t)| t.members.iter().any(|m| m.id == id))
            .map(|(tid, _)| tid)
            .collect()
    }

    /// Queue `id` for repainting on `tile`. Returns true if it was not queued yet.
    ///
    /// A Rendered tile moves to ReRendering; other states keep theirs.
    pub fn mark_dirty(&mut self, tile: TileId, id: PrimitiveId) -> bool {
        let t = &mut self.tiles[tile.idx()];
        let added = t.dirty.insert(id);
        if t.state == TileState::Rendered {
            t.state = TileState::ReRendering;
        }
        added
    }

    /// Mark `id` dirty on every tile that lists it and return those tiles.
    pub fn mark_primitive_dirty(&mut self, id: PrimitiveId) -> Vec<TileId> {
        let owners = self.find_tiles_containing(id);
        for &tile in &owners {
            self.mark_dirty(tile, id);
        }
        owners
    }

    /// Whether `tile` may be sent for a full render.
    pub fn can_render(&self, tile: TileId) -> bool {
        let t = &self.tiles[tile.idx()];
        !t.locked && t.state == TileState::Unrendered
    }

    /// Record that a full render of `tile` was dispatched.
    ///
    /// Returns false, changing nothing, if the tile is not eligible.
    pub fn begin_render(&mut self, tile: TileId) -> bool {
        if !self.can_render(tile) {
            return false;
        }
        let t = &mut self.tiles[tile.idx()];
        t.state = TileState::Rendering;
        t.locked = true;
        t.dirty.clear();
        true
    }

    /// Apply a full render completion.
    ///
    /// The raster is kept only if rasters were not invalidated meanwhile and
    /// the tile's level is still `active_level`.
    pub fn finish_render(&mut self, tile: TileId, raster: Arc<R>, active_level: u8) -> Completion {
        let t = &mut self.tiles[tile.idx()];
        debug_assert!(t.locked, "render completion for an unlocked tile");
        t.locked = false;
        if std::mem::take(&mut t.invalidated) {
            t.reset();
            return Completion::Invalidated;
        }
        if t.key.level != active_level {
            t.reset();
            return Completion::Stale;
        }
        t.raster = Some(raster);
        t.state = if t.dirty.is_empty() {
            TileState::Rendered
        } else {
            TileState::ReRendering
        };
        Completion::Applied
    }

    /// Snapshot what a RePatch of `tile` needs, if it is eligible.
    ///
    /// Eligible means ReRendering, unlocked, and holding a raster.
    pub fn patch_ticket(&self, tile: TileId) -> Option<PatchTicket<R>> {
        let t = &self.tiles[tile.idx()];
        if t.locked || t.state != TileState::ReRendering {
            return None;
        }
        Some(PatchTicket {
            raster: t.raster.clone()?,
            dirty: t.dirty.iter().copied().collect(),
        })
    }

    /// Record that a RePatch of `tile` was dispatched: Rendered, locked, queue drained.
    pub fn begin_patch(&mut self, tile: TileId) -> bool {
        let t = &mut self.tiles[tile.idx()];
        if t.locked || t.state != TileState::ReRendering || t.raster.is_none() {
            return false;
        }
        t.state = TileState::Rendered;
        t.locked = true;
        t.dirty.clear();
        true
    }

    /// Apply a RePatch completion.
    ///
    /// Marks that arrived in flight keep the tile in ReRendering.
    pub fn finish_patch(&mut self, tile: TileId, raster: Arc<R>) -> Completion {
        let t = &mut self.tiles[tile.idx()];
        debug_assert!(t.locked, "patch completion for an unlocked tile");
        t.locked = false;
        if std::mem::take(&mut t.invalidated) {
            t.reset();
            return Completion::Invalidated;
        }
        t.raster = Some(raster);
        Completion::Applied
    }

    /// Unlock `tile` after a request that produced nothing and send it back to Unrendered.
    pub fn release(&mut self, tile: TileId) {
        let t = &mut self.tiles[tile.idx()];
        t.locked = false;
        t.invalidated = false;
        t.reset();
    }

    /// Drop every cached raster.
    ///
    /// Idle tiles reset to Unrendered now; tiles with a request in flight stay
    /// locked and reset when that completion arrives.
    pub fn invalidate_rasters(&mut self) {
        let mut deferred = 0_usize;
        for t in &mut self.tiles {
            if t.locked {
                t.invalidated = true;
                deferred += 1;
            } else {
                t.reset();
            }
        }
        log::debug!(
            "invalidated {} tiles ({} in flight)",
            self.tiles.len(),
            deferred
        );
    }

    fn materialize(&mut self, key: TileKey, parent: Option<TileId>) -> TileId {
        let rect = self.grid.tile_rect(key);
        let wpp = self.grid.world_per_pixel(key.level);
        let cols = &self.columns;
        let keep = |m: &Member| overlaps(cols.bounds(m.id, wpp), rect);
        let members: Arc<[Member]> = match parent {
            Some(p) => self.tiles[p.idx()].members.iter().copied().filter(keep).collect(),
            None => cols.members().filter(keep).collect(),
        };
        log::trace!(
            "tile {}:{} built with {} members",
            key.level,
            key.index,
            members.len()
        );
        let id = tile_id(self.tiles.len());
        self.tiles.push(Tile::new(key, rect, parent, members));
        self.by_key.insert(key, id);
        id
    }
}

fn tile_id(i: usize) -> TileId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Tile arenas stay far below u32::MAX entries."
    )]
    let id = i as u32;
    TileId(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Rect};
    use quickcheck_macros::quickcheck;
    use understory_scene::{GeometryStore, PathPrimitive, RectPrimitive};

    fn scene(rects: &[Rect]) -> Arc<SceneColumns> {
        let mut store = GeometryStore::new();
        for &rect in rects {
            store
                .add_rect(RectPrimitive {
                    rect,
                    ..Default::default()
                })
                .unwrap();
        }
        store.flush()
    }

    fn ids<R>(index: &SpatialIndex<R>, tile: TileId) -> Vec<u32> {
        index.tile(tile).members().iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn repeated_flush_yields_same_level_one_membership() {
        let mut store = GeometryStore::new();
        for (i, x) in [0.0, 40.0, 150.0, 260.0].into_iter().enumerate() {
            store
                .add_rect(RectPrimitive {
                    rect: Rect::new(x, x * 0.5, x + 30.0, x * 0.5 + 30.0),
                    z: i32::try_from(i % 2).unwrap(),
                    ..Default::default()
                })
                .unwrap();
        }
        store
            .add_path(PathPrimitive {
                from: Point::new(0.0, 200.0),
                to: Point::new(290.0, 10.0),
                width: 2.0,
                keep_width: true,
                ..Default::default()
            })
            .unwrap();
        let first = store.flush();
        let second = store.flush();
        assert_eq!(first.boundary(), second.boundary());

        let mut a = SpatialIndex::<()>::new(first, 256);
        let mut b = SpatialIndex::<()>::new(second, 256);
        for i in 0..4 {
            let ta = a.get_tile(1, i).unwrap();
            let tb = b.get_tile(1, i).unwrap();
            assert_eq!(a.tile(ta).members(), b.tile(tb).members(), "tile {i}");
        }
    }

    #[test]
    fn single_rect_is_in_all_four_level_one_tiles() {
        let mut index = SpatialIndex::<()>::new(scene(&[Rect::new(0.0, 0.0, 100.0, 100.0)]), 256);
        for i in 0..4 {
            let t = index.get_tile(1, i).unwrap();
            assert_eq!(ids(&index, t), vec![0]);
        }
        assert_eq!(index.find_tiles_containing(PrimitiveId(0)).len(), 4);
    }

    #[test]
    fn out_of_range_keys_are_rejected() {
        let mut index = SpatialIndex::<()>::new(scene(&[Rect::new(0.0, 0.0, 1.0, 1.0)]), 256);
        assert!(index.get_tile(0, 0).is_none());
        assert!(index.get_tile(1, 4).is_none());
        assert!(index.get_tile(DEFAULT_MAX_LEVEL + 1, 0).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn deep_lookup_builds_ancestors_once() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(90.0, 90.0, 100.0, 100.0),
        ];
        let mut index = SpatialIndex::<()>::new(scene(&rects), 256);
        let key = index.grid().key_at(4, Point::new(5.0, 5.0)).unwrap();
        let t = index.get_tile_by_key(key).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(ids(&index, t), vec![0]);
        let again = index.get_tile_by_key(key).unwrap();
        assert_eq!(t, again);
        assert_eq!(index.len(), 4);
        let mut up = index.tile(t).parent();
        let mut levels = vec![];
        while let Some(p) = up {
            levels.push(index.tile(p).key().level);
            up = index.tile(p).parent();
        }
        assert_eq!(levels, vec![3, 2, 1]);
    }

    #[test]
    fn kept_width_paths_narrow_with_depth() {
        let mut store = GeometryStore::new();
        store
            .add_path(PathPrimitive {
                from: Point::new(0.0, 50.0),
                to: Point::new(100.0, 50.0),
                width: 8.0,
                keep_width: true,
                ..Default::default()
            })
            .unwrap();
        let mut index = SpatialIndex::<()>::new(store.flush(), 64);
        let g = *index.grid();
        assert!(g.world_per_pixel(2) < g.world_per_pixel(1));
        let below = g.key_at(3, Point::new(50.0, 51.5)).unwrap();
        let t = index.get_tile_by_key(below).unwrap();
        let parent = index.tile(t).parent().unwrap();
        assert!(index.tile(parent).members().len() >= index.tile(t).members().len());
    }

    #[test]
    fn dirty_marks_deduplicate() {
        let mut index = SpatialIndex::<u8>::new(scene(&[Rect::new(0.0, 0.0, 10.0, 10.0)]), 256);
        let t = index.get_tile(1, 0).unwrap();
        assert!(index.begin_render(t));
        assert_eq!(index.finish_render(t, Arc::new(1), 1), Completion::Applied);
        assert_eq!(index.tile(t).state(), TileState::Rendered);

        assert!(index.mark_dirty(t, PrimitiveId(0)));
        assert!(!index.mark_dirty(t, PrimitiveId(0)));
        assert!(!index.mark_dirty(t, PrimitiveId(0)));
        assert_eq!(index.tile(t).state(), TileState::ReRendering);

        let ticket = index.patch_ticket(t).unwrap();
        assert_eq!(ticket.dirty, vec![PrimitiveId(0)]);
        assert!(index.begin_patch(t));
        assert_eq!(index.tile(t).state(), TileState::Rendered);
        assert!(index.patch_ticket(t).is_none());
        assert_eq!(index.finish_patch(t, Arc::new(2)), Completion::Applied);
        assert_eq!(index.tile(t).drawable().map(|r| **r), Some(2));
    }

    #[test]
    fn lock_survives_marks_and_resize_in_flight() {
        let mut index = SpatialIndex::<u8>::new(scene(&[Rect::new(0.0, 0.0, 10.0, 10.0)]), 256);
        let t = index.get_tile(1, 0).unwrap();
        assert!(index.begin_render(t));
        assert!(!index.begin_render(t));
        index.mark_dirty(t, PrimitiveId(0));
        index.invalidate_rasters();
        index.mark_dirty(t, PrimitiveId(0));
        assert!(index.tile(t).is_locked());
        assert_eq!(index.tile(t).state(), TileState::Rendering);
        assert!(!index.begin_render(t));
        assert_eq!(index.in_flight(), 1);

        assert_eq!(
            index.finish_render(t, Arc::new(1), 1),
            Completion::Invalidated
        );
        assert_eq!(index.tile(t).state(), TileState::Unrendered);
        assert!(index.tile(t).raster().is_none());
        assert!(!index.tile(t).is_locked());
        assert!(index.begin_render(t));
        assert_eq!(index.finish_render(t, Arc::new(1), 1), Completion::Applied);
    }

    #[test]
    fn marks_during_render_leave_tile_rerendering() {
        let mut index = SpatialIndex::<u8>::new(scene(&[Rect::new(0.0, 0.0, 10.0, 10.0)]), 256);
        let t = index.get_tile(1, 0).unwrap();
        index.begin_render(t);
        index.mark_dirty(t, PrimitiveId(0));
        assert_eq!(index.finish_render(t, Arc::new(1), 1), Completion::Applied);
        assert_eq!(index.tile(t).state(), TileState::ReRendering);
    }

    #[test]
    fn release_returns_tile_to_unrendered() {
        let mut index = SpatialIndex::<u8>::new(scene(&[Rect::new(0.0, 0.0, 10.0, 10.0)]), 256);
        let t = index.get_tile(1, 0).unwrap();
        index.begin_render(t);
        index.release(t);
        assert!(index.can_render(t));
        assert_eq!(index.in_flight(), 0);
    }

    #[test]
    fn stale_level_resets_tile() {
        let mut index = SpatialIndex::<u8>::new(scene(&[Rect::new(0.0, 0.0, 10.0, 10.0)]), 256);
        let t = index.get_tile(1, 0).unwrap();
        index.begin_render(t);
        assert_eq!(index.finish_render(t, Arc::new(1), 2), Completion::Stale);
        assert_eq!(index.tile(t).state(), TileState::Unrendered);
        assert!(index.can_render(t));
    }

    #[quickcheck]
    fn child_membership_is_subset_of_parent(
        shapes: Vec<(u8, u8, u8, u8, bool)>,
        path: Vec<u8>,
    ) -> bool {
        let mut store = GeometryStore::new();
        for (x, y, w, h, kept) in shapes {
            let (x, y) = (f64::from(x), f64::from(y));
            if kept {
                store
                    .add_path(PathPrimitive {
                        from: Point::new(x, y),
                        to: Point::new(x + f64::from(w), y + f64::from(h)),
                        width: f64::from(w % 16),
                        keep_width: true,
                        ..Default::default()
                    })
                    .unwrap();
            } else {
                store
                    .add_rect(RectPrimitive {
                        rect: Rect::new(x, y, x + f64::from(w), y + f64::from(h)),
                        ..Default::default()
                    })
                    .unwrap();
            }
        }
        let mut index = SpatialIndex::<()>::with_max_level(store.flush(), 64, 5);
        let first = path.first().copied().unwrap_or(0);
        let Some(mut tile) = index.get_tile(1, u64::from(first % 4)) else {
            return false;
        };
        for step in path.iter().skip(1).take(4) {
            let key = index.tile(tile).key();
            let Some(child_key) = key.children().nth(usize::from(step % 16)) else {
                return false;
            };
            let Some(child) = index.get_tile_by_key(child_key) else {
                return false;
            };
            let parent = index.tile(tile).members().clone();
            if !index
                .tile(child)
                .members()
                .iter()
                .all(|m| parent.contains(m))
            {
                return false;
            }
            tile = child;
        }
        true
    }
}
