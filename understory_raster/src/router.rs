// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Completion routing.
//!
//! A waiter subscribes to the [`CompletionKey`] of the request it dispatched;
//! publishing that key hands the completion to exactly that one waiter. A key
//! has at most one waiter at a time, which mirrors the one-request-per-tile
//! lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::protocol::CompletionKey;

/// Publish/subscribe router from completion keys to waiters.
#[derive(Clone, Debug)]
pub struct CompletionRouter<W> {
    waiters: HashMap<CompletionKey, W>,
}

impl<W> Default for CompletionRouter<W> {
    fn default() -> Self {
        Self {
            waiters: HashMap::new(),
        }
    }
}

impl<W> CompletionRouter<W> {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `waiter` for `key`. Returns false, keeping the existing
    /// waiter, if the key is already taken.
    pub fn subscribe(&mut self, key: CompletionKey, waiter: W) -> bool {
        match self.waiters.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(waiter);
                true
            }
        }
    }

    /// Remove and return the waiter for `key`.
    pub fn publish(&mut self, key: CompletionKey) -> Option<W> {
        self.waiters.remove(&key)
    }

    /// Whether a waiter is registered for `key`.
    pub fn is_waiting(&self, key: CompletionKey) -> bool {
        self.waiters.contains_key(&key)
    }

    /// Number of registered waiters.
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// True if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestKind;
    use understory_tiles::TileKey;

    #[test]
    fn one_waiter_per_key() {
        let mut router = CompletionRouter::new();
        let render = CompletionKey::new(TileKey::new(2, 9), RequestKind::Render);
        let patch = CompletionKey::new(TileKey::new(2, 9), RequestKind::RePatch);
        assert!(router.subscribe(render, "a"));
        assert!(!router.subscribe(render, "b"));
        assert!(router.subscribe(patch, "c"));
        assert_eq!(router.publish(render), Some("a"));
        assert_eq!(router.publish(render), None);
        assert!(router.is_waiting(patch));
        assert_eq!(router.len(), 1);
    }
}
