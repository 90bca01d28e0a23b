// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use std::time::Duration;

use understory_scene::DEFAULT_BOUNDARY_MARGIN;
use understory_tiles::DEFAULT_MAX_LEVEL;

/// Tunables for a [`TiledScene`](crate::TiledScene).
///
/// Construct with struct update syntax over [`EngineConfig::default`].
///
/// ```
/// use std::time::Duration;
/// use understory_viewport::EngineConfig;
///
/// let config = EngineConfig {
///     worker_count: 2,
///     tick_period: Duration::from_millis(30),
///     ..EngineConfig::default()
/// };
/// assert_eq!(config.tile_size, 1024);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Rasterization threads.
    pub worker_count: usize,
    /// Raster side length of a tile, in pixels.
    pub tile_size: u32,
    /// Padding around the union of primitive bounds, in world units.
    pub boundary_margin: f64,
    /// Deepest tile level.
    pub max_level: u8,
    /// Hit tests never use a coarser level than this.
    pub hit_test_min_level: u8,
    /// Minimum time between maintenance ticks.
    pub tick_period: Duration,
    /// Minimum time between applied pan/zoom gestures.
    pub gesture_interval: Duration,
    /// Hover hit tests are skipped for this long after a zoom.
    pub hover_suppression: Duration,
    /// Resizes are applied once the size has been stable this long.
    pub resize_debounce: Duration,
    /// Zoom ratio per wheel step.
    pub zoom_step: f64,
    /// Smallest zoom factor a wheel gesture may reach.
    pub min_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            tile_size: 1024,
            boundary_margin: DEFAULT_BOUNDARY_MARGIN,
            max_level: DEFAULT_MAX_LEVEL,
            hit_test_min_level: 3,
            tick_period: Duration::from_millis(60),
            gesture_interval: Duration::from_millis(16),
            hover_suppression: Duration::from_millis(120),
            resize_debounce: Duration::from_millis(100),
            zoom_step: 1.1,
            min_scale: 0.25,
        }
    }
}
