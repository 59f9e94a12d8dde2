// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the view tree: node identifiers, flags, pointer-events modes, and local
//! geometry.

use kurbo::{Affine, Insets, Rect, RoundedRect};

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this identifier. Stable for the node's lifetime, reused after removal.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of this identifier.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Node flags controlling participation in hit testing.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. Invisible nodes and their subtrees are never hit.
        const VISIBLE = 0b0000_0001;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Whether a node and its children can be the target of pointer input.
///
/// Mirrors the four `pointerEvents` modes of native view hierarchies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerEvents {
    /// The node and its children are both eligible.
    #[default]
    Auto,
    /// The node is never a target, but its children can be.
    BoxNone,
    /// The node can be a target, but its children cannot.
    BoxOnly,
    /// Neither the node nor any of its descendants can be a target.
    None,
}

impl PointerEvents {
    /// Returns `true` if the node itself may be returned from a hit test.
    pub const fn accepts_self(self) -> bool {
        matches!(self, Self::Auto | Self::BoxOnly)
    }

    /// Returns `true` if the node's children may be returned from a hit test.
    pub const fn accepts_children(self) -> bool {
        matches!(self, Self::Auto | Self::BoxNone)
    }
}

/// Local geometry and input configuration for a node.
#[derive(Clone, Debug)]
pub struct LocalNode {
    /// Local (untransformed) bounds.
    pub local_bounds: Rect,
    /// Local transform relative to parent space.
    pub local_transform: Affine,
    /// Optional local clip. Points outside it miss the node and its whole subtree.
    pub local_clip: Option<RoundedRect>,
    /// Z-order within the parent. Higher is painted on top and hit first.
    pub z_index: i32,
    /// Extra touch area around `local_bounds`, in local units.
    ///
    /// The enlarged area never extends past the parent's own bounds, and a sibling's
    /// real bounds always take precedence over it.
    pub hit_slop: Option<Insets>,
    /// Which of the node and its children may be hit.
    pub pointer_events: PointerEvents,
    /// Visibility flags.
    pub flags: NodeFlags,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            local_bounds: Rect::ZERO,
            local_transform: Affine::IDENTITY,
            local_clip: None,
            z_index: 0,
            hit_slop: None,
            pointer_events: PointerEvents::Auto,
            flags: NodeFlags::default(),
        }
    }
}
