// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile View Tree: an arena-indexed view hierarchy with touch-aware hit testing.
//!
//! - Represents a hierarchy of views with local bounds, transforms, clips, and z-order.
//! - Each view carries a [`PointerEvents`] mode and an optional hit slop.
//! - [`Tree::hit_test_point`] returns the deepest eligible view under a point, together
//!   with its root→target path, which is what responder negotiation walks.
//!
//! ## Not a layout engine
//!
//! This crate does not measure or arrange views. Upstream code computes positions and
//! sizes, writes them into the tree, and calls [`Tree::commit`] before feeding input.
//! Bounds that are stale at sample time produce mis-hits; keeping them current is the
//! layout provider's job.
//!
//! ## Hit testing rules
//!
//! - Traversal is depth-first, front to back: among siblings, higher `z_index` first, and
//!   for equal z the later-inserted sibling first.
//! - [`PointerEvents::None`] removes a view and its subtree, [`PointerEvents::BoxNone`]
//!   removes only the view, [`PointerEvents::BoxOnly`] removes only its children.
//! - Hit slop enlarges a view's touch area without enlarging its bounds. The enlarged area is
//!   clipped to the parent's own bounds, and a sibling's real bounds always win over slop.
//!
//! ## API overview
//!
//! - [`Tree`]: container managing nodes and world-space synchronization.
//! - [`LocalNode`]: per-node data (bounds, transform, clip, z, slop, pointer events, flags).
//! - [`NodeId`]: generational handle of a node.
//! - [`Hit`]: result of a hit test.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod tree;
mod types;
mod util;

pub use tree::{Hit, Tree};
pub use types::{LocalNode, NodeFlags, NodeId, PointerEvents};

/// Re-exported so callers can build hit slop without naming `kurbo` directly.
pub use kurbo::Insets;
