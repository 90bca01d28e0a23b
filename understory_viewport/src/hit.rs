// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer hit testing against the tile index.
//!
//! Candidates come from the membership of the tile under the pointer, at the
//! active level but never coarser than a configured minimum level, so the
//! list stays short. They are walked in reverse z order (topmost first) and
//! filtered by capability before the closed point test.

use std::collections::BTreeSet;
use std::sync::Arc;

use kurbo::Point;
use understory_scene::{Interactions, Member, PrimitiveId, contains};
use understory_tiles::SpatialIndex;

/// A hover transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HoverEvent {
    /// The pointer entered the primitive.
    Enter(PrimitiveId),
    /// The pointer left the primitive.
    Leave(PrimitiveId),
}

impl HoverEvent {
    /// The primitive concerned.
    pub fn target(self) -> PrimitiveId {
        match self {
            Self::Enter(id) | Self::Leave(id) => id,
        }
    }
}

/// Where and at what resolution a hit test runs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitContext {
    /// Pointer in world coordinates.
    pub world: Point,
    /// Active view level.
    pub level: u8,
    /// World units per screen pixel, for kept-width strokes.
    pub world_per_pixel: f64,
}

/// Hover tracking and click resolution.
#[derive(Clone, Debug)]
pub struct HitTester {
    min_level: u8,
    hovered: BTreeSet<PrimitiveId>,
}

impl HitTester {
    /// Create a hit tester that queries tiles at `min_level` or deeper.
    pub fn new(min_level: u8) -> Self {
        Self {
            min_level: min_level.max(1),
            hovered: BTreeSet::new(),
        }
    }

    /// Primitives currently hovered.
    pub fn hovered(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.hovered.iter().copied()
    }

    /// Forget all hover state, returning a leave for each entry.
    pub fn clear(&mut self) -> Vec<HoverEvent> {
        std::mem::take(&mut self.hovered)
            .into_iter()
            .map(HoverEvent::Leave)
            .collect()
    }

    /// Membership of the tile under the pointer.
    pub fn candidates<R>(&self, index: &mut SpatialIndex<R>, ctx: &HitContext) -> Arc<[Member]> {
        let level = ctx.level.max(self.min_level).min(index.max_level());
        index
            .grid()
            .key_at(level, ctx.world)
            .and_then(|key| index.get_tile_by_key(key))
            .map(|t| index.tile(t).members().clone())
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Update hover state for a pointer move.
    ///
    /// Tracked entries whose bounds no longer contain the pointer leave; the
    /// topmost hover-capable primitive under the pointer enters unless it is
    /// already tracked.
    pub fn hover<R>(
        &mut self,
        index: &mut SpatialIndex<R>,
        capabilities: impl Fn(PrimitiveId) -> Interactions,
        ctx: &HitContext,
    ) -> Vec<HoverEvent> {
        let mut events = Vec::new();
        let cols = index.columns().clone();
        let inside = |id: PrimitiveId| {
            id.idx() < cols.len() && contains(cols.bounds(id, ctx.world_per_pixel), ctx.world)
        };
        self.hovered.retain(|&id| {
            let keep = inside(id);
            if !keep {
                events.push(HoverEvent::Leave(id));
            }
            keep
        });
        let candidates = self.candidates(index, ctx);
        let top = candidates
            .iter()
            .rev()
            .find(|m| capabilities(m.id).contains(Interactions::HOVER) && inside(m.id));
        if let Some(m) = top {
            if self.hovered.insert(m.id) {
                events.push(HoverEvent::Enter(m.id));
            }
        }
        events
    }

    /// Topmost primitive under the pointer carrying `capability`.
    pub fn check<R>(
        &self,
        index: &mut SpatialIndex<R>,
        capabilities: impl Fn(PrimitiveId) -> Interactions,
        ctx: &HitContext,
        capability: Interactions,
    ) -> Option<PrimitiveId> {
        let cols = index.columns().clone();
        self.candidates(index, ctx)
            .iter()
            .rev()
            .find(|m| {
                capabilities(m.id).contains(capability)
                    && contains(cols.bounds(m.id, ctx.world_per_pixel), ctx.world)
            })
            .map(|m| m.id)
    }
}
