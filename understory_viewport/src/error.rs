// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced to hosts.

use understory_raster::{AtlasError, DispatchError};
use understory_scene::GeometryError;

/// Any failure of a [`TiledScene`](crate::TiledScene) operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected primitive.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Rejected icon source.
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    /// Worker communication failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// Worker threads could not be spawned.
    #[error("failed to spawn raster workers")]
    Spawn(#[from] std::io::Error),
    /// The atlas can only be loaded once per scene.
    #[error("atlas already loaded")]
    AtlasLoaded,
}
