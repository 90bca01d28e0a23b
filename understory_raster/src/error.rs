// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas and dispatch errors.

/// Reasons an icon source is rejected while loading the atlas.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    /// SVG path data did not parse.
    #[error("icon `{name}` has invalid SVG path data")]
    PathData {
        /// Entry name.
        name: String,
    },
    /// A polygon needs at least three points.
    #[error("icon `{name}` polygon has {points} points, need at least 3")]
    Polygon {
        /// Entry name.
        name: String,
        /// Points supplied.
        points: usize,
    },
    /// Bitmap dimensions do not match the buffer.
    #[error("icon `{name}` bitmap is {width}x{height} but has {len} bytes")]
    Bitmap {
        /// Entry name.
        name: String,
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Buffer length.
        len: usize,
    },
    /// The name is already taken.
    #[error("icon `{0}` is defined twice")]
    Duplicate(String),
}

/// Why a request was not handed to a worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Every worker is busy; retry later.
    #[error("no idle worker")]
    Backoff,
    /// Workers have not received their resources yet.
    #[error("worker pool is not initialised")]
    NotInitialized,
    /// The selected worker thread has exited.
    #[error("worker {0} disconnected")]
    Disconnected(usize),
}
