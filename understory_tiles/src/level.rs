// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level arithmetic.
//!
//! Level `L` splits the world boundary into `side_number(L)²` cells, with
//! `side_number(L) = 2^(2L-1)`. Each step down multiplies the side by four, so
//! every tile has a 4×4 fan of children.

/// Deepest level materialized by default.
pub const DEFAULT_MAX_LEVEL: u8 = 10;

/// Children per axis of one parent tile.
pub const FAN_OUT: u64 = 4;

/// Number of tiles along one axis at `level`.
///
/// `level` must be at least 1.
#[inline]
pub const fn side_number(level: u8) -> u64 {
    debug_assert!(level >= 1, "levels start at 1");
    1_u64 << (2 * level as u32 - 1)
}

/// Total number of tiles at `level`.
#[inline]
pub const fn tile_count(level: u8) -> u64 {
    let side = side_number(level);
    side * side
}

/// Pick the level that best matches zoom factor `k`.
///
/// `k <= 4` maps to level 1, and the level grows by one each time `k` passes
/// the next power-of-four band: `(4, 16]` is level 2, `(16, 64]` is level 3.
/// The result never exceeds `max_level`.
pub fn level_for_scale(k: f64, max_level: u8) -> u8 {
    let mut level = 1_u8;
    let mut band = FAN_OUT as f64;
    while k > band && level < max_level {
        level += 1;
        band *= FAN_OUT as f64;
    }
    level
}
