// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, updates, queries.

use alloc::{vec, vec::Vec};
use kurbo::{Affine, Insets, Point, Rect, RoundedRect, Shape};
use smallvec::SmallVec;

use crate::types::{LocalNode, NodeFlags, NodeId, PointerEvents};
use crate::util::{slop_rect, transform_rect_bbox};

/// Sibling lists are short in practice; keep ordering buffers on the stack.
type Ordered = SmallVec<[NodeId; 8]>;

/// Arena-backed view tree.
///
/// Nodes are addressed by generational [`NodeId`]s and store parent/child links as
/// identifiers, never pointers.
///
/// Hit testing only sees geometry (bounds, transform, clip) as of the last [`Tree::commit`].
/// Local geometry changes are batched until then, and a node inserted since the last commit
/// cannot be hit yet. Structure (parent and child links) and input-related settings (pointer
/// events, hit slop, flags, z-index) are read directly at query time.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use tactile_view_tree::{LocalNode, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(
///     None,
///     LocalNode {
///         local_bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
///         ..LocalNode::default()
///     },
/// );
///
/// // Changes only take effect after commit.
/// tree.commit();
///
/// let hit = tree.hit_test_point(Point::new(10.0, 10.0)).unwrap();
/// assert_eq!(hit.node, root);
/// ```
pub struct Tree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Parentless nodes in insertion order.
    roots: Vec<NodeId>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("roots", &self.roots.len())
            .finish_non_exhaustive()
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Results of a hit test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    /// The matched node.
    pub node: NodeId,
    /// Path from root to node (inclusive).
    pub path: Vec<NodeId>,
}

/// Geometry captured by the last commit. Hit testing reads nothing else.
#[derive(Clone, Debug, Default)]
struct WorldNode {
    committed: bool,
    world_transform: Affine,
    /// Maps world points into the node's local space.
    inverse: Affine,
    bounds: Rect,
    clip: Option<RoundedRect>,
    world_bounds: Rect, // AABB of transformed (and clipped) local bounds
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    world: WorldNode,
    dirty: bool,
}

impl Node {
    fn new(generation: u32, local: LocalNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            world: WorldNode::default(),
            dirty: true,
        }
    }

    fn is_hittable(&self) -> bool {
        self.world.committed
            && self.local.pointer_events != PointerEvents::None
            && self.local.flags.contains(NodeFlags::VISIBLE)
    }
}

impl Tree {
    /// Create a new empty tree.
    ///
    /// After inserting nodes or mutating local geometry, call [`Tree::commit`] to
    /// update world-space transforms and bounds before issuing queries.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Insert a new node as the last (frontmost among equal z) child of `parent`,
    /// or as a root if `None`.
    ///
    /// The returned [`NodeId`] becomes live immediately, but it is only hit tested after the
    /// next call to [`Tree::commit`]. A stale `parent` inserts a root.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        match parent {
            Some(p) if self.is_alive(p) => self.link_parent(id, p),
            _ => self.roots.push(id),
        }
        id
    }

    /// Remove a node (and its subtree) from the tree.
    ///
    /// All identifiers in the subtree become stale immediately.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.unlink(id);
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes[id.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(id.idx());
            }
        }
    }

    /// Reparent `id` under `new_parent` (or make it a root with `None`).
    ///
    /// Moving a node under itself or one of its descendants is ignored.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.is_ancestor_or_self(id, p))
        {
            return;
        }
        self.unlink(id);
        match new_parent {
            Some(p) => self.link_parent(id, p),
            None => self.roots.push(id),
        }
        self.node_mut(id).dirty = true;
    }

    /// Update local transform.
    pub fn set_local_transform(&mut self, id: NodeId, tf: Affine) {
        if let Some(n) = self.node_opt_mut(id)
            && n.local.local_transform != tf
        {
            n.local.local_transform = tf;
            n.dirty = true;
        }
    }

    /// Update local clip.
    pub fn set_local_clip(&mut self, id: NodeId, clip: Option<RoundedRect>) {
        if let Some(n) = self.node_opt_mut(id)
            && n.local.local_clip != clip
        {
            n.local.local_clip = clip;
            n.dirty = true;
        }
    }

    /// Update local bounds.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: Rect) {
        if let Some(n) = self.node_opt_mut(id)
            && n.local.local_bounds != bounds
        {
            n.local.local_bounds = bounds;
            n.dirty = true;
        }
    }

    /// Update z index.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.z_index = z;
        }
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.flags = flags;
        }
    }

    /// Update the hit slop of a node.
    pub fn set_hit_slop(&mut self, id: NodeId, slop: Option<Insets>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.hit_slop = slop;
        }
    }

    /// Update the pointer-events mode of a node.
    pub fn set_pointer_events(&mut self, id: NodeId, mode: PointerEvents) {
        if let Some(n) = self.node_opt_mut(id) {
            n.local.pointer_events = mode;
        }
    }

    /// Return the world transform for a live node as of the last [`Tree::commit`].
    ///
    /// `None` for stale identifiers and for nodes inserted since the last commit.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        self.committed(id).map(|world| world.world_transform)
    }

    /// Return the world-space axis-aligned bounding box for a live node as of the last
    /// [`Tree::commit`]. Loose under rotation; does not include hit slop.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        self.committed(id).map(|world| world.world_bounds)
    }

    fn committed(&self, id: NodeId) -> Option<&WorldNode> {
        self.node_opt(id)
            .map(|node| &node.world)
            .filter(|world| world.committed)
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    /// Recompute world-space transforms and bounds for every node whose local
    /// geometry changed since the last commit.
    ///
    /// Returns `true` if any node was updated.
    pub fn commit(&mut self) -> bool {
        let roots = self.roots.clone();
        let mut updated = false;
        for root in roots {
            updated |= self.update_world(root);
        }
        updated
    }

    /// Hit test a world-space point and return the deepest eligible node and its path.
    ///
    /// - Siblings are visited front to back: higher `z_index` first, then later
    ///   insertions first. Roots are ordered the same way.
    /// - [`PointerEvents`] and [`NodeFlags::VISIBLE`] decide which nodes are eligible.
    /// - A node's clip excludes its whole subtree outside the clip.
    /// - Hit slop only applies after every sibling subtree missed with real bounds, and
    ///   never reaches past the parent's own bounds.
    pub fn hit_test_point(&self, point: Point) -> Option<Hit> {
        let node = self.hit_among(&self.roots, point)?;
        Some(Hit {
            node,
            path: self.path_to(node),
        })
    }

    fn hit_among(&self, ids: &[NodeId], point: Point) -> Option<NodeId> {
        let ordered = self.front_to_back(ids);
        // Real bounds of every sibling subtree take precedence over any sibling's slop.
        if let Some(hit) = ordered.iter().find_map(|&id| self.hit_subtree(id, point)) {
            return Some(hit);
        }
        ordered
            .iter()
            .copied()
            .find(|&id| self.slop_contains(id, point))
    }

    fn hit_subtree(&self, id: NodeId, point: Point) -> Option<NodeId> {
        let node = self.node(id);
        if !node.is_hittable() {
            return None;
        }
        let world = &node.world;
        let local_point = world.inverse * point;
        if let Some(clip) = world.clip
            && !clip.contains(local_point)
        {
            return None;
        }
        if node.local.pointer_events.accepts_children()
            && let Some(hit) = self.hit_among(&node.children, point)
        {
            return Some(hit);
        }
        let accepts_self = node.local.pointer_events.accepts_self();
        (accepts_self && world.bounds.contains(local_point)).then_some(id)
    }

    fn slop_contains(&self, id: NodeId, point: Point) -> bool {
        let node = self.node(id);
        let Some(slop) = node.local.hit_slop else {
            return false;
        };
        if !node.is_hittable() || !node.local.pointer_events.accepts_self() {
            return false;
        }
        let world = &node.world;
        let local_point = world.inverse * point;
        if let Some(clip) = world.clip
            && !clip.contains(local_point)
        {
            return false;
        }
        if !slop_rect(world.bounds, slop).contains(local_point) {
            return false;
        }
        // Slop never reaches past the parent's own bounds.
        match node.parent {
            Some(parent_id) => {
                let parent = &self.node(parent_id).world;
                parent.bounds.contains(parent.inverse * point)
            }
            None => true,
        }
    }

    /// Order `ids` front to back: descending z, later siblings first among equal z.
    fn front_to_back(&self, ids: &[NodeId]) -> Ordered {
        let mut ordered: Ordered = ids.iter().rev().copied().collect();
        ordered.sort_by(|a, b| self.node(*b).local.z_index.cmp(&self.node(*a).local.z_index));
        ordered
    }
}

impl Tree {
    // --- queries ---

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns the z-index of a node if the identifier is live.
    pub fn z_index(&self, id: NodeId) -> Option<i32> {
        self.node_opt(id).map(|node| node.local.z_index)
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Returns the flags of a node if the identifier is live.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|node| node.local.flags)
    }

    /// Returns the pointer-events mode of a node if the identifier is live.
    pub fn pointer_events(&self, id: NodeId) -> Option<PointerEvents> {
        self.node_opt(id).map(|node| node.local.pointer_events)
    }

    /// Returns the hit slop of a node, if live and set.
    pub fn hit_slop(&self, id: NodeId) -> Option<Insets> {
        self.node_opt(id).and_then(|node| node.local.hit_slop)
    }

    /// Get the children of a node in insertion order, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Parentless nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Path from the root down to `id` (inclusive). Empty for stale identifiers.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.node_opt(id).map(|_| id);
        while let Some(n) = current {
            path.push(n);
            current = self.node(n).parent;
        }
        path.reverse();
        path
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node_opt(id).map(|_| id);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }

    // --- internals ---

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink(&mut self, id: NodeId) {
        match self.node(id).parent {
            Some(parent) => {
                self.node_mut(parent).children.retain(|c| *c != id);
                self.node_mut(id).parent = None;
            }
            None => self.roots.retain(|r| *r != id),
        }
    }

    fn update_world(&mut self, root_id: NodeId) -> bool {
        // Walk depth-first, propagating transforms and clips toward the leaves. A clean
        // node below a dirty one is recomputed too, since its parent transform may differ.
        let mut updated = false;
        let mut stack = vec![(root_id, Affine::IDENTITY, None::<Rect>, false)];

        while let Some((id, parent_tf, parent_clip, parent_dirty)) = stack.pop() {
            let node = self.node_mut(id);
            let dirty = node.dirty || parent_dirty;
            if dirty {
                let world_transform = parent_tf * node.local.local_transform;
                let mut world_bounds =
                    transform_rect_bbox(world_transform, node.local.local_bounds);
                if let Some(c) = parent_clip {
                    world_bounds = world_bounds.intersect(c);
                }
                node.world = WorldNode {
                    committed: true,
                    world_transform,
                    inverse: world_transform.inverse(),
                    bounds: node.local.local_bounds,
                    clip: node.local.local_clip,
                    world_bounds,
                };
                node.dirty = false;
                updated = true;
            }
            let local_clip = node
                .world
                .clip
                .map(|rr| transform_rect_bbox(node.world.world_transform, rr.rect()));
            let world_clip = match (local_clip, parent_clip) {
                (Some(local), Some(parent)) => Some(local.intersect(parent)),
                (Some(local), None) => Some(local),
                (None, parent) => parent,
            };

            // The `.rev()` means children are visited in the order given in `node.children`.
            for &child in node.children.iter().rev() {
                stack.push((child, node.world.world_transform, world_clip, dirty));
            }
        }
        updated
    }
}
