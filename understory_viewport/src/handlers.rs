// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction handlers and the capability table.

use std::collections::HashMap;
use std::fmt;

use kurbo::Point;
use understory_scene::{Highlights, Interactions, PrimitiveId, SceneColumns};

/// The interactions a handler can be bound to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// Pointer enter/leave.
    Hover,
    /// Primary click.
    Click,
    /// Secondary click.
    RightClick,
    /// Double click.
    DoubleClick,
}

impl InteractionKind {
    /// Capability bit for this kind.
    pub const fn flag(self) -> Interactions {
        match self {
            Self::Hover => Interactions::HOVER,
            Self::Click => Interactions::CLICK,
            Self::RightClick => Interactions::RIGHT_CLICK,
            Self::DoubleClick => Interactions::DOUBLE_CLICK,
        }
    }
}

/// What a handler is told.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    /// The pointer entered `0`.
    HoverEnter(PrimitiveId),
    /// The pointer left `0`.
    HoverLeave(PrimitiveId),
    /// A click-family press.
    Press {
        /// Which press.
        kind: InteractionKind,
        /// Primitive hit; `None` for background listeners.
        target: Option<PrimitiveId>,
        /// Pointer in world coordinates.
        world: Point,
    },
}

/// A caller-supplied handler. It may change highlight state.
pub type Handler = Box<dyn FnMut(&InteractionEvent, &mut Highlights)>;

/// Handlers per primitive and kind, plus background listeners per kind.
///
/// The table also keeps the effective capability flags: the flags declared at
/// ingestion plus one for every registered handler.
#[derive(Default)]
pub struct HandlerTable {
    handlers: HashMap<(PrimitiveId, InteractionKind), Handler>,
    background: HashMap<InteractionKind, Handler>,
    caps: Vec<Interactions>,
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("handlers", &self.handlers.len())
            .field("background", &self.background.len())
            .finish_non_exhaustive()
    }
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload capability flags from a new snapshot.
    pub fn sync(&mut self, columns: &SceneColumns) {
        self.caps = vec![Interactions::empty(); columns.len()];
        for &id in columns.z_order() {
            self.caps[id.idx()] = columns.interactions(id);
        }
        for &(id, kind) in self.handlers.keys() {
            if let Some(c) = self.caps.get_mut(id.idx()) {
                *c |= kind.flag();
            }
        }
    }

    /// Bind `handler` to `kind` on `id`, replacing any previous one.
    pub fn on(&mut self, id: PrimitiveId, kind: InteractionKind, handler: Handler) {
        if let Some(c) = self.caps.get_mut(id.idx()) {
            *c |= kind.flag();
        }
        self.handlers.insert((id, kind), handler);
    }

    /// Bind a listener for presses of `kind` that hit nothing.
    pub fn on_background(&mut self, kind: InteractionKind, handler: Handler) {
        self.background.insert(kind, handler);
    }

    /// Effective capability flags of `id`.
    pub fn capabilities(&self, id: PrimitiveId) -> Interactions {
        self.caps.get(id.idx()).copied().unwrap_or_default()
    }

    /// Run the handler for `(id, kind)`. Returns false if none is bound.
    pub fn invoke(
        &mut self,
        id: PrimitiveId,
        kind: InteractionKind,
        event: &InteractionEvent,
        highlights: &mut Highlights,
    ) -> bool {
        match self.handlers.get_mut(&(id, kind)) {
            Some(h) => {
                h(event, highlights);
                true
            }
            None => false,
        }
    }

    /// Run the background listener for `kind`. Returns false if none is bound.
    pub fn invoke_background(
        &mut self,
        kind: InteractionKind,
        event: &InteractionEvent,
        highlights: &mut Highlights,
    ) -> bool {
        match self.background.get_mut(&kind) {
            Some(h) => {
                h(event, highlights);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_scene::{GeometryStore, RectPrimitive};

    #[test]
    fn registering_sets_capability() {
        let mut store = GeometryStore::new();
        let a = store
            .add_rect(RectPrimitive {
                interactions: Interactions::HOVER,
                ..Default::default()
            })
            .unwrap();
        let b = store.add_rect(RectPrimitive::default()).unwrap();
        let cols = store.flush();
        let mut table = HandlerTable::new();
        table.sync(&cols);
        assert_eq!(table.capabilities(a), Interactions::HOVER);
        assert_eq!(table.capabilities(b), Interactions::empty());

        table.on(b, InteractionKind::Click, Box::new(|_, h| {
            h.toggle_checked(PrimitiveId(1));
        }));
        assert_eq!(table.capabilities(b), Interactions::CLICK);
        table.sync(&cols);
        assert_eq!(table.capabilities(b), Interactions::CLICK);

        let mut hl = Highlights::new();
        let ev = InteractionEvent::Press {
            kind: InteractionKind::Click,
            target: Some(b),
            world: Point::ORIGIN,
        };
        assert!(table.invoke(b, InteractionKind::Click, &ev, &mut hl));
        assert!(hl.is_checked(b));
        assert!(!table.invoke(a, InteractionKind::Click, &ev, &mut hl));
        assert!(!table.invoke_background(InteractionKind::Click, &ev, &mut hl));
    }
}
