// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Highlight state shared between interaction handlers and painting.

use std::collections::BTreeSet;

use crate::primitive::PrimitiveId;

/// Per-primitive visual state toggled by interaction.
///
/// Painting substitutes an atlas entry's hover or checked variant for
/// primitives marked here. Workers receive an immutable snapshot with every
/// request, so a change only becomes visible once the affected tiles are
/// patched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlights {
    hovered: BTreeSet<PrimitiveId>,
    checked: BTreeSet<PrimitiveId>,
    revision: u64,
}

impl Highlights {
    /// Create an empty highlight set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is hovered.
    pub fn is_hovered(&self, id: PrimitiveId) -> bool {
        self.hovered.contains(&id)
    }

    /// Whether `id` is checked.
    pub fn is_checked(&self, id: PrimitiveId) -> bool {
        self.checked.contains(&id)
    }

    /// Set or clear the hovered mark. Returns true if it changed.
    pub fn set_hovered(&mut self, id: PrimitiveId, on: bool) -> bool {
        let changed = if on {
            self.hovered.insert(id)
        } else {
            self.hovered.remove(&id)
        };
        self.bump(changed)
    }

    /// Set or clear the checked mark. Returns true if it changed.
    pub fn set_checked(&mut self, id: PrimitiveId, on: bool) -> bool {
        let changed = if on {
            self.checked.insert(id)
        } else {
            self.checked.remove(&id)
        };
        self.bump(changed)
    }

    /// Flip the checked mark and return the new value.
    pub fn toggle_checked(&mut self, id: PrimitiveId) -> bool {
        let on = !self.is_checked(id);
        self.set_checked(id, on);
        on
    }

    /// Monotone counter bumped on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ids whose hovered or checked mark differs between `self` and `other`.
    pub fn diff(&self, other: &Self) -> BTreeSet<PrimitiveId> {
        let hovered = self.hovered.symmetric_difference(&other.hovered);
        let checked = self.checked.symmetric_difference(&other.checked);
        hovered.chain(checked).copied().collect()
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }
}
