// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-device responder slot.

/// Holds at most one responder.
///
/// Only the negotiator and the tracker change the holder, so there is never more than one
/// responder per device and every change of holder is paired with the matching
/// grant, terminate, or release notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponderSlot<K> {
    holder: Option<K>,
}

impl<K> Default for ResponderSlot<K> {
    fn default() -> Self {
        Self { holder: None }
    }
}

impl<K: Copy + PartialEq> ResponderSlot<K> {
    /// An empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current holder.
    pub fn holder(&self) -> Option<K> {
        self.holder
    }

    /// Returns `true` if nobody holds the slot.
    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }

    /// Returns `true` if `node` holds the slot.
    pub fn is_held_by(&self, node: &K) -> bool {
        self.holder.as_ref() == Some(node)
    }

    /// Install `node`, returning the displaced holder.
    pub(crate) fn occupy(&mut self, node: K) -> Option<K> {
        self.holder.replace(node)
    }

    /// Empty the slot, returning the previous holder.
    pub(crate) fn clear(&mut self) -> Option<K> {
        self.holder.take()
    }
}
