// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Responder negotiation.
//!
//! ## Overview
//!
//! Decides which node of a root → target path claims a device's responder slot, and moves
//! the slot to it.
//!
//! ## Claim order
//!
//! - Capture: root → target. The first node whose capture predicate answers `true` claims.
//!   Ancestors closer to the root win.
//! - Bubble: target → root, only if capture found nothing. The deepest node whose predicate
//!   answers `true` claims.
//! - The current holder is never asked; it already owns the slot.
//!
//! ## Transfer
//!
//! - Unowned slot: the claimant is offered `onResponderGrant`. Declining leaves the slot empty.
//! - Owned slot: the holder is asked `onResponderTerminationRequest`. A refusal (or a missing
//!   hook, unless [`TrackerConfig::yield_without_termination_hook`] is set) keeps the holder
//!   and sends `onResponderReject` to the claimant. A yield grants the claimant first; if it
//!   accepts, the previous holder receives `onResponderTerminate`.
//! - [`Negotiator::force_takeover`] skips all of the above.
//!
//! Hook errors in predicates, grants, and termination requests count as a negative answer
//! and are logged at `warn`. Notification errors are recorded in the [`Transcript`].

use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::config::TrackerConfig;
use crate::error::HookFailure;
use crate::hooks::{Claim, ClaimHook, Grant, HookKind, Notification, ResponderHooks};
use crate::slot::ResponderSlot;
use crate::types::{ParentLookup, Phase, ResponderEvent};

/// One lifecycle hook addressed to a node while handling a sample.
///
/// Deliveries are recorded whether or not the node implements the hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Delivery<K> {
    /// Addressed node.
    pub node: K,
    /// Which hook.
    pub hook: HookKind,
}

/// Deliveries and notification failures of one operation, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Transcript<K> {
    deliveries: SmallVec<[Delivery<K>; 4]>,
    failures: Vec<HookFailure<K>>,
}

impl<K> Default for Transcript<K> {
    fn default() -> Self {
        Self {
            deliveries: SmallVec::new(),
            failures: Vec::new(),
        }
    }
}

impl<K> Transcript<K> {
    /// An empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifecycle hooks addressed so far.
    pub fn deliveries(&self) -> &[Delivery<K>] {
        &self.deliveries
    }

    /// Notification failures so far.
    pub fn failures(&self) -> &[HookFailure<K>] {
        &self.failures
    }

    pub(crate) fn into_parts(self) -> (SmallVec<[Delivery<K>; 4]>, Vec<HookFailure<K>>) {
        (self.deliveries, self.failures)
    }
}

impl<K: Copy + fmt::Debug> Transcript<K> {
    pub(crate) fn notify<H: ResponderHooks<K> + ?Sized>(
        &mut self,
        hooks: &mut H,
        node: K,
        notification: Notification,
        event: &ResponderEvent<'_, K>,
    ) {
        let hook = notification.kind();
        self.deliveries.push(Delivery { node, hook });
        if !hooks.capabilities(&node).contains(hook.capability()) {
            return;
        }
        if let Err(source) = hooks.notify(&node, notification, event) {
            tracing::warn!(node = ?node, %hook, error = %source, "notification hook failed");
            self.failures.push(HookFailure { node, hook, source });
        }
    }

    pub(crate) fn grant<H: ResponderHooks<K> + ?Sized>(
        &mut self,
        hooks: &mut H,
        node: K,
        event: &ResponderEvent<'_, K>,
    ) -> Grant {
        let hook = HookKind::ResponderGrant;
        self.deliveries.push(Delivery { node, hook });
        if !hooks.capabilities(&node).contains(hook.capability()) {
            return Grant::Accept;
        }
        hooks.grant(&node, event).unwrap_or_else(|error| {
            tracing::warn!(node = ?node, %hook, %error, "grant hook failed; declining");
            Grant::Decline
        })
    }
}

/// Node that won the claim phases, and the phase it won in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Claimant<K> {
    /// Claiming node.
    pub node: K,
    /// [`Phase::Capture`] or [`Phase::Bubble`].
    pub phase: Phase,
}

/// Outcome of one negotiation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Negotiation<K> {
    /// No node claimed.
    Unclaimed,
    /// The unowned slot went to `node`.
    Granted {
        /// New responder.
        node: K,
    },
    /// The holder yielded and the slot moved to `node`.
    Transferred {
        /// New responder.
        node: K,
        /// Previous holder, which was terminated.
        previous: K,
    },
    /// The holder refused to yield; `claimant` was rejected.
    Rejected {
        /// Node that claimed.
        claimant: K,
        /// Node that kept the slot.
        holder: K,
    },
    /// `node` claimed but declined the grant; the slot is left unowned.
    ///
    /// A holder that had agreed to yield is terminated all the same.
    Declined {
        /// Node that declined.
        node: K,
    },
}

impl<K: Copy> Negotiation<K> {
    /// The node that received the slot, if it changed hands.
    pub fn new_responder(&self) -> Option<K> {
        match *self {
            Self::Granted { node } | Self::Transferred { node, .. } => Some(node),
            _ => None,
        }
    }
}

/// Rebuild the root → `target` path through a parent lookup.
///
/// The lookup must describe an acyclic ancestry.
pub fn reconstruct_path<K: Copy>(target: K, parents: &(impl ParentLookup<K> + ?Sized)) -> Vec<K> {
    let mut out = Vec::new();
    let mut cur = target;
    loop {
        out.push(cur);
        match parents.parent_of(&cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out.reverse();
    out
}

/// Runs the claim protocol against a [`ResponderSlot`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Negotiator {
    yield_without_termination_hook: bool,
}

impl Negotiator {
    /// A negotiator applying `config`'s policies.
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            yield_without_termination_hook: config.yield_without_termination_hook,
        }
    }

    /// Run the capture then bubble phases over `path` (root → target), skipping `holder`.
    pub fn find_claimant<K, H>(
        &self,
        claim: Claim,
        path: &[K],
        holder: Option<&K>,
        hooks: &mut H,
        event: &ResponderEvent<'_, K>,
    ) -> Option<Claimant<K>>
    where
        K: Copy + PartialEq + fmt::Debug,
        H: ResponderHooks<K> + ?Sized,
    {
        let eligible = |n: &&K| holder != Some(*n);

        let capture = claim.capture_hook();
        for node in path.iter().filter(eligible) {
            if ask(hooks, node, capture, event) {
                return Some(Claimant {
                    node: *node,
                    phase: Phase::Capture,
                });
            }
        }

        let bubble = claim.bubble_hook();
        for node in path.iter().rev().filter(eligible) {
            if ask(hooks, node, bubble, event) {
                return Some(Claimant {
                    node: *node,
                    phase: Phase::Bubble,
                });
            }
        }
        None
    }

    /// Negotiate `slot` for one sample.
    ///
    /// `event.responder` should match the holder of `slot` when the sample arrived.
    pub fn negotiate<K, H>(
        &self,
        claim: Claim,
        path: &[K],
        slot: &mut ResponderSlot<K>,
        hooks: &mut H,
        event: &ResponderEvent<'_, K>,
        transcript: &mut Transcript<K>,
    ) -> Negotiation<K>
    where
        K: Copy + PartialEq + fmt::Debug,
        H: ResponderHooks<K> + ?Sized,
    {
        let holder = slot.holder();
        let Some(Claimant { node, phase }) =
            self.find_claimant(claim, path, holder.as_ref(), hooks, event)
        else {
            return Negotiation::Unclaimed;
        };
        tracing::trace!(claimant = ?node, ?phase, ?claim, "claim");

        let Some(holder) = holder else {
            return match transcript.grant(hooks, node, event) {
                Grant::Accept => {
                    slot.occupy(node);
                    tracing::debug!(responder = ?node, "responder granted");
                    Negotiation::Granted { node }
                }
                Grant::Decline => {
                    tracing::debug!(node = ?node, "grant declined");
                    Negotiation::Declined { node }
                }
            };
        };

        if !self.holder_yields(hooks, holder, event) {
            tracing::debug!(holder = ?holder, claimant = ?node, "holder refused to yield");
            transcript.notify(hooks, node, Notification::Reject, event);
            return Negotiation::Rejected {
                claimant: node,
                holder,
            };
        }

        match transcript.grant(hooks, node, event) {
            Grant::Accept => {
                slot.occupy(node);
                tracing::debug!(responder = ?node, previous = ?holder, "responder transferred");
                transcript.notify(hooks, holder, Notification::Terminate, event);
                Negotiation::Transferred {
                    node,
                    previous: holder,
                }
            }
            Grant::Decline => {
                // The holder already agreed to yield, so the slot goes back to unowned.
                slot.clear();
                tracing::debug!(node = ?node, previous = ?holder, "grant declined; slot released");
                transcript.notify(hooks, holder, Notification::Terminate, event);
                Negotiation::Declined { node }
            }
        }
    }

    /// Terminate the holder of `slot` unconditionally, then offer the slot to `new_owner`.
    ///
    /// The holder receives exactly one `onResponderTerminate`. Returns the previous holder
    /// and, if a new owner was named, whether it accepted.
    pub fn force_takeover<K, H>(
        &self,
        slot: &mut ResponderSlot<K>,
        new_owner: Option<K>,
        hooks: &mut H,
        event: &ResponderEvent<'_, K>,
        transcript: &mut Transcript<K>,
    ) -> (Option<K>, Option<Grant>)
    where
        K: Copy + PartialEq + fmt::Debug,
        H: ResponderHooks<K> + ?Sized,
    {
        let previous = slot.clear();
        if let Some(previous) = previous {
            tracing::debug!(previous = ?previous, "forced takeover");
            transcript.notify(hooks, previous, Notification::Terminate, event);
        }
        let grant = new_owner.map(|node| {
            let answer = transcript.grant(hooks, node, event);
            if answer == Grant::Accept {
                slot.occupy(node);
                tracing::debug!(responder = ?node, "responder granted by takeover");
            }
            answer
        });
        (previous, grant)
    }

    fn holder_yields<K, H>(&self, hooks: &mut H, holder: K, event: &ResponderEvent<'_, K>) -> bool
    where
        K: Copy + fmt::Debug,
        H: ResponderHooks<K> + ?Sized,
    {
        let hook = HookKind::ResponderTerminationRequest;
        if !hooks.capabilities(&holder).contains(hook.capability()) {
            return self.yield_without_termination_hook;
        }
        hooks
            .termination_request(&holder, event)
            .unwrap_or_else(|error| {
                tracing::warn!(
                    node = ?holder,
                    %hook,
                    %error,
                    "termination request failed; keeping holder"
                );
                false
            })
    }
}

fn ask<K, H>(hooks: &mut H, node: &K, hook: ClaimHook, event: &ResponderEvent<'_, K>) -> bool
where
    K: fmt::Debug,
    H: ResponderHooks<K> + ?Sized,
{
    let kind = hook.kind();
    if !hooks.capabilities(node).contains(kind.capability()) {
        return false;
    }
    hooks
        .should_set_responder(node, hook, event)
        .unwrap_or_else(|error| {
            tracing::warn!(node = ?node, hook = %kind, %error, "claim predicate failed");
            false
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::hooks::{HookSet, NodeHooks};
    use crate::types::{DeviceId, GestureId, PointerSample, SamplePhase};
    use alloc::vec;
    use kurbo::Point;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    struct Node(u32);

    struct Parents;
    impl ParentLookup<Node> for Parents {
        fn parent_of(&self, node: &Node) -> Option<Node> {
            match node.0 {
                3 => Some(Node(2)),
                2 => Some(Node(1)),
                _ => None,
            }
        }
    }

    const PATH: [Node; 3] = [Node(1), Node(2), Node(3)];

    fn sample() -> PointerSample {
        PointerSample::new(DeviceId::touch(0), SamplePhase::Start, Point::ZERO, 0)
    }

    fn event<'a>(s: &'a PointerSample, responder: Option<Node>) -> ResponderEvent<'a, Node> {
        ResponderEvent {
            gesture: GestureId(1),
            sample: s,
            target: Some(Node(3)),
            responder,
            history: core::slice::from_ref(s),
        }
    }

    fn claims(hooks: &mut HookSet<Node>, node: u32, capture: bool) {
        let h = if capture {
            NodeHooks::new().on_start_should_set_responder_capture(|_| Ok(true))
        } else {
            NodeHooks::new().on_start_should_set_responder(|_| Ok(true))
        };
        hooks.register(Node(node), h);
    }

    fn hooks_of(t: &Transcript<Node>) -> Vec<(u32, HookKind)> {
        t.deliveries().iter().map(|d| (d.node.0, d.hook)).collect()
    }

    #[test]
    fn reconstructs_root_to_target() {
        assert_eq!(reconstruct_path(Node(3), &Parents), PATH);
        assert_eq!(reconstruct_path(Node(7), &Parents), [Node(7)]);
    }

    #[test]
    fn deepest_bubble_claimant_wins() {
        let mut hooks = HookSet::new();
        for n in 1..=3 {
            claims(&mut hooks, n, false);
        }
        let s = sample();
        let c = Negotiator::default().find_claimant(
            Claim::Start,
            &PATH,
            None,
            &mut hooks,
            &event(&s, None),
        );
        assert_eq!(
            c,
            Some(Claimant {
                node: Node(3),
                phase: Phase::Bubble
            })
        );
    }

    #[test]
    fn outermost_capture_claimant_beats_bubble() {
        let mut hooks = HookSet::new();
        claims(&mut hooks, 3, false);
        claims(&mut hooks, 2, true);
        claims(&mut hooks, 1, true);
        let s = sample();
        let c = Negotiator::default().find_claimant(
            Claim::Start,
            &PATH,
            None,
            &mut hooks,
            &event(&s, None),
        );
        assert_eq!(c.map(|c| (c.node, c.phase)), Some((Node(1), Phase::Capture)));
    }

    #[test]
    fn holder_is_never_asked() {
        let mut hooks = HookSet::new();
        claims(&mut hooks, 3, false);
        let s = sample();
        let c = Negotiator::default().find_claimant(
            Claim::Start,
            &PATH,
            Some(&Node(3)),
            &mut hooks,
            &event(&s, Some(Node(3))),
        );
        assert_eq!(c, None);
    }

    #[test]
    fn failing_predicate_counts_as_false() {
        let mut hooks = HookSet::new();
        hooks.register(
            Node(1),
            NodeHooks::new().on_start_should_set_responder_capture(|_| Err(HookError::new("nope"))),
        );
        claims(&mut hooks, 2, false);
        let s = sample();
        let c = Negotiator::default().find_claimant(
            Claim::Start,
            &PATH,
            None,
            &mut hooks,
            &event(&s, None),
        );
        assert_eq!(c.map(|c| c.node), Some(Node(2)));
    }

    #[test]
    fn grant_on_empty_slot() {
        let mut hooks = HookSet::new();
        claims(&mut hooks, 2, false);
        let mut slot = ResponderSlot::new();
        let mut t = Transcript::new();
        let s = sample();
        let n = Negotiator::default().negotiate(
            Claim::Start,
            &PATH,
            &mut slot,
            &mut hooks,
            &event(&s, None),
            &mut t,
        );
        assert_eq!(n, Negotiation::Granted { node: Node(2) });
        assert_eq!(slot.holder(), Some(Node(2)));
        assert_eq!(hooks_of(&t), vec![(2, HookKind::ResponderGrant)]);
    }

    #[test]
    fn declined_grant_leaves_slot_empty() {
        let mut hooks = HookSet::new();
        hooks.register(
            Node(3),
            NodeHooks::new()
                .on_start_should_set_responder(|_| Ok(true))
                .on_responder_grant(|_| Ok(Grant::Decline)),
        );
        let mut slot = ResponderSlot::new();
        let mut t = Transcript::new();
        let s = sample();
        let n = Negotiator::default().negotiate(
            Claim::Start,
            &PATH,
            &mut slot,
            &mut hooks,
            &event(&s, None),
            &mut t,
        );
        assert_eq!(n, Negotiation::Declined { node: Node(3) });
        assert!(slot.is_empty());
    }

    #[test]
    fn refusing_holder_rejects_claimant() {
        let mut hooks = HookSet::new();
        hooks.register(
            Node(1),
            NodeHooks::new()
                .on_start_should_set_responder_capture(|_| Ok(true))
                .on_responder_reject(|_| Ok(())),
        );
        hooks.register(
            Node(3),
            NodeHooks::new().on_responder_termination_request(|_| Ok(false)),
        );
        let mut slot = ResponderSlot::new();
        slot.occupy(Node(3));
        let mut t = Transcript::new();
        let s = sample();
        let n = Negotiator::default().negotiate(
            Claim::Start,
            &PATH,
            &mut slot,
            &mut hooks,
            &event(&s, Some(Node(3))),
            &mut t,
        );
        assert_eq!(
            n,
            Negotiation::Rejected {
                claimant: Node(1),
                holder: Node(3)
            }
        );
        assert_eq!(slot.holder(), Some(Node(3)));
        assert_eq!(hooks_of(&t), vec![(1, HookKind::ResponderReject)]);
    }

    #[test]
    fn missing_termination_hook_follows_config() {
        let mut hooks = HookSet::new();
        claims(&mut hooks, 1, true);
        let s = sample();
        let ev = event(&s, Some(Node(3)));

        let mut slot = ResponderSlot::new();
        slot.occupy(Node(3));
        let mut t = Transcript::new();
        let strict = Negotiator::default();
        let n = strict.negotiate(Claim::Start, &PATH, &mut slot, &mut hooks, &ev, &mut t);
        assert!(matches!(n, Negotiation::Rejected { .. }));

        let lenient =
            Negotiator::new(&TrackerConfig::default().with_yield_without_termination_hook(true));
        let mut t = Transcript::new();
        let n = lenient.negotiate(Claim::Start, &PATH, &mut slot, &mut hooks, &ev, &mut t);
        assert_eq!(
            n,
            Negotiation::Transferred {
                node: Node(1),
                previous: Node(3)
            }
        );
        // New responder is granted before the old one is terminated.
        assert_eq!(
            hooks_of(&t),
            vec![(1, HookKind::ResponderGrant), (3, HookKind::ResponderTerminate)]
        );
    }

    #[test]
    fn declined_transfer_leaves_slot_unowned() {
        let mut hooks = HookSet::new();
        hooks.register(
            Node(1),
            NodeHooks::new()
                .on_start_should_set_responder_capture(|_| Ok(true))
                .on_responder_grant(|_| Err(HookError::new("broken"))),
        );
        hooks.register(
            Node(3),
            NodeHooks::new().on_responder_termination_request(|_| Ok(true)),
        );
        let mut slot = ResponderSlot::new();
        slot.occupy(Node(3));
        let mut t = Transcript::new();
        let s = sample();
        let n = Negotiator::default().negotiate(
            Claim::Start,
            &PATH,
            &mut slot,
            &mut hooks,
            &event(&s, Some(Node(3))),
            &mut t,
        );
        assert_eq!(n, Negotiation::Declined { node: Node(1) });
        assert!(slot.is_empty());
        // The holder agreed to yield, so it is terminated even though nobody took over.
        assert_eq!(
            hooks_of(&t),
            vec![(1, HookKind::ResponderGrant), (3, HookKind::ResponderTerminate)]
        );
        assert!(t.failures().is_empty());
    }

    #[test]
    fn force_takeover_terminates_once_and_reassigns() {
        let mut hooks = HookSet::new();
        hooks.register(
            Node(3),
            NodeHooks::new()
                .on_responder_termination_request(|_| Ok(false))
                .on_responder_terminate(|_| Err(HookError::new("late"))),
        );
        let mut slot = ResponderSlot::new();
        slot.occupy(Node(3));
        let mut t = Transcript::new();
        let s = sample();
        let (previous, grant) = Negotiator::default().force_takeover(
            &mut slot,
            Some(Node(1)),
            &mut hooks,
            &event(&s, Some(Node(3))),
            &mut t,
        );
        assert_eq!(previous, Some(Node(3)));
        assert_eq!(grant, Some(Grant::Accept));
        assert_eq!(slot.holder(), Some(Node(1)));
        assert_eq!(
            hooks_of(&t),
            vec![(3, HookKind::ResponderTerminate), (1, HookKind::ResponderGrant)]
        );
        assert_eq!(t.failures().len(), 1);
        assert_eq!(t.failures()[0].hook, HookKind::ResponderTerminate);
    }
}
