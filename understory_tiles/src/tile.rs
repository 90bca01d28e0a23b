// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile records and their render state.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use kurbo::Rect;
use understory_scene::{Member, PrimitiveId};

use crate::grid::TileKey;

/// Handle to a materialized tile inside a [`SpatialIndex`](crate::SpatialIndex).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// Position in the tile arena.
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Render state of a tile.
///
/// Transitions are linear per tile:
/// `Unrendered → Rendering → Rendered → ReRendering → Rendered → …`.
/// A resize or a stale completion sends a tile back to `Unrendered`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileState {
    /// No raster; eligible for a full render.
    #[default]
    Unrendered,
    /// A full render is in flight.
    Rendering,
    /// The raster is current.
    Rendered,
    /// The raster is usable but has queued dirty primitives.
    ReRendering,
}

/// One cell of the hierarchy.
///
/// The membership list is fixed at construction; only render state, the
/// cached raster, and the dirty queue change afterwards.
pub struct Tile<R> {
    pub(crate) key: TileKey,
    pub(crate) rect: Rect,
    pub(crate) parent: Option<TileId>,
    pub(crate) members: Arc<[Member]>,
    pub(crate) state: TileState,
    pub(crate) raster: Option<Arc<R>>,
    pub(crate) dirty: BTreeSet<PrimitiveId>,
    pub(crate) locked: bool,
    pub(crate) invalidated: bool,
}

impl<R> Tile<R> {
    pub(crate) fn new(
        key: TileKey,
        rect: Rect,
        parent: Option<TileId>,
        members: Arc<[Member]>,
    ) -> Self {
        Self {
            key,
            rect,
            parent,
            members,
            state: TileState::Unrendered,
            raster: None,
            dirty: BTreeSet::new(),
            locked: false,
            invalidated: false,
        }
    }

    /// Level and index.
    pub fn key(&self) -> TileKey {
        self.key
    }

    /// World rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Enclosing tile one level up.
    pub fn parent(&self) -> Option<TileId> {
        self.parent
    }

    /// Primitives overlapping this tile, in z order.
    pub fn members(&self) -> &Arc<[Member]> {
        &self.members
    }

    /// Current render state.
    pub fn state(&self) -> TileState {
        self.state
    }

    /// Cached raster, whatever the state.
    pub fn raster(&self) -> Option<&Arc<R>> {
        self.raster.as_ref()
    }

    /// The raster if the tile may be composited.
    pub fn drawable(&self) -> Option<&Arc<R>> {
        match self.state {
            TileState::Rendered | TileState::ReRendering => self.raster.as_ref(),
            TileState::Unrendered | TileState::Rendering => None,
        }
    }

    /// Queued dirty primitives, ascending.
    pub fn dirty(&self) -> impl ExactSizeIterator<Item = PrimitiveId> + '_ {
        self.dirty.iter().copied()
    }

    /// A request for this tile is in flight.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The in-flight result will be discarded.
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    pub(crate) fn reset(&mut self) {
        self.state = TileState::Unrendered;
        self.raster = None;
        self.dirty.clear();
    }
}

impl<R> fmt::Debug for Tile<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("key", &self.key)
            .field("state", &self.state)
            .field("members", &self.members.len())
            .field("dirty", &self.dirty.len())
            .field("has_raster", &self.raster.is_some())
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}
