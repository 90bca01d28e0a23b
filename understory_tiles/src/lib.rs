// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Tiles: a multi-resolution tile hierarchy over a flushed scene.
//!
//! The world boundary of a [`SceneColumns`](understory_scene::SceneColumns) snapshot is split
//! into levels; level `L` has `2^(2L-1)` tiles per side, and each tile fans out into a 4×4 grid
//! of children one level down.
//!
//! - Tiles are built lazily on first access ([`SpatialIndex::get_tile`]) and memoized.
//! - Level-1 tiles scan the scene; deeper tiles filter their parent's membership, so a
//!   child's members are always a subset of its parent's.
//! - Each tile carries a render state machine, a cached raster, a deduplicated dirty queue,
//!   and a lock that allows at most one request in flight.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_scene::{GeometryStore, RectPrimitive};
//! use understory_tiles::{SpatialIndex, TileState, level_for_scale};
//!
//! let mut store = GeometryStore::new();
//! store
//!     .add_rect(RectPrimitive {
//!         rect: Rect::new(0.0, 0.0, 100.0, 100.0),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let mut index = SpatialIndex::<Vec<u8>>::new(store.flush(), 256);
//! let level = level_for_scale(1.0, index.max_level());
//! let tile = index.get_tile(level, 0).unwrap();
//! assert_eq!(index.tile(tile).members().len(), 1);
//! assert_eq!(index.tile(tile).state(), TileState::Unrendered);
//! ```

pub mod grid;
pub mod index;
pub mod level;
pub mod tile;

pub use grid::{TileGrid, TileKey};
pub use index::{Completion, LEVEL_LIMIT, PatchTicket, SpatialIndex};
pub use level::{DEFAULT_MAX_LEVEL, FAN_OUT, level_for_scale, side_number, tile_count};
pub use tile::{Tile, TileId, TileState};
