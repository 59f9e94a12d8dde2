// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter for Tactile View Tree.
//!
//! ## Feature
//!
//! Enable with `view_tree_adapter` (on by default).
//!
//! ## Notes
//!
//! Hit testing uses the tree's committed world geometry. Call [`Tree::commit`] after layout
//! changes and before feeding samples to the tracker.

use alloc::vec::Vec;

use kurbo::Point;
use tactile_view_tree::{NodeId, Tree};

use crate::types::{HitTest, ParentLookup};

impl ParentLookup<NodeId> for Tree {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        Tree::parent_of(self, *node)
    }
}

impl HitTest<NodeId> for Tree {
    fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.hit_test_point(point).map(|hit| hit.node)
    }
}

/// Hit test `point` and return the root → target path directly from the tree.
///
/// Empty when nothing is hit.
pub fn hit_path(tree: &Tree, point: Point) -> Vec<NodeId> {
    tree.hit_test_point(point)
        .map(|hit| hit.path)
        .unwrap_or_default()
}
