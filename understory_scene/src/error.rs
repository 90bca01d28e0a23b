// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ingestion errors.

/// Reasons a primitive is rejected by [`GeometryStore`](crate::GeometryStore).
///
/// A rejected primitive is never partially added.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A coordinate or size is NaN or infinite.
    #[error("primitive has a non-finite {field}")]
    NonFinite {
        /// Offending field.
        field: &'static str,
    },
    /// A size or width is negative.
    #[error("primitive has a negative {field}: {value}")]
    Negative {
        /// Offending field.
        field: &'static str,
        /// Value supplied.
        value: f64,
    },
    /// Opacity outside `[0, 1]`.
    #[error("opacity {0} is outside [0, 1]")]
    Opacity(f32),
    /// Font size that is not strictly positive.
    #[error("font size must be positive, got {0}")]
    FontSize(f64),
    /// Dash entries must be finite, non-negative, and sum to a positive length.
    #[error("dash pattern entries must be finite and non-negative with a positive sum")]
    Dash,
    /// More primitives than `PrimitiveId` can address.
    #[error("primitive id space exhausted")]
    IdSpaceExhausted,
}
