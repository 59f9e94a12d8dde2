// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Application hooks: the per-node predicates and notifications that take part in
//! responder negotiation.
//!
//! ## Capabilities
//!
//! Every node reports a [`Capabilities`] record naming the hooks it implements. The
//! negotiator consults the record before calling into [`ResponderHooks`], so a node with no
//! claim predicates is skipped without a call, and a missing termination-request hook is
//! treated per [`TrackerConfig`](crate::config::TrackerConfig).
//!
//! Two ways to provide hooks:
//!
//! - Implement [`ResponderHooks`] on your own type (one object serving every node).
//! - Register per-node closures in a [`HookSet`]; capabilities are derived from which
//!   closures were supplied at registration time.
//!
//! ```
//! use tactile_responder::hooks::{Capabilities, HookSet, NodeHooks, ResponderHooks};
//!
//! let mut hooks: HookSet<u32> = HookSet::new();
//! hooks.register(
//!     7,
//!     NodeHooks::new()
//!         .on_start_should_set_responder(|_| Ok(true))
//!         .on_responder_move(|ev| {
//!             let _ = ev.sample.point;
//!             Ok(())
//!         }),
//! );
//! assert_eq!(
//!     hooks.capabilities(&7),
//!     Capabilities::START_CLAIM | Capabilities::MOVE
//! );
//! assert!(hooks.capabilities(&8).is_empty());
//! ```

use alloc::boxed::Box;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::error::HookError;
use crate::types::ResponderEvent;

bitflags::bitflags! {
    /// Which hooks a node implements.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        /// `onStartShouldSetResponderCapture`.
        const START_CAPTURE = 1 << 0;
        /// `onStartShouldSetResponder`.
        const START_CLAIM = 1 << 1;
        /// `onMoveShouldSetResponderCapture`.
        const MOVE_CAPTURE = 1 << 2;
        /// `onMoveShouldSetResponder`.
        const MOVE_CLAIM = 1 << 3;
        /// `onResponderGrant`.
        const GRANT = 1 << 4;
        /// `onResponderReject`.
        const REJECT = 1 << 5;
        /// `onResponderStart`.
        const START = 1 << 6;
        /// `onResponderMove`.
        const MOVE = 1 << 7;
        /// `onResponderEnd`.
        const END = 1 << 8;
        /// `onResponderRelease`.
        const RELEASE = 1 << 9;
        /// `onResponderTerminate`.
        const TERMINATE = 1 << 10;
        /// `onResponderTerminationRequest`.
        const TERMINATION_REQUEST = 1 << 11;
    }
}

/// Names every hook, for logging and error reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// `onStartShouldSetResponderCapture`.
    StartShouldSetResponderCapture,
    /// `onStartShouldSetResponder`.
    StartShouldSetResponder,
    /// `onMoveShouldSetResponderCapture`.
    MoveShouldSetResponderCapture,
    /// `onMoveShouldSetResponder`.
    MoveShouldSetResponder,
    /// `onResponderGrant`.
    ResponderGrant,
    /// `onResponderReject`.
    ResponderReject,
    /// `onResponderStart`.
    ResponderStart,
    /// `onResponderMove`.
    ResponderMove,
    /// `onResponderEnd`.
    ResponderEnd,
    /// `onResponderRelease`.
    ResponderRelease,
    /// `onResponderTerminate`.
    ResponderTerminate,
    /// `onResponderTerminationRequest`.
    ResponderTerminationRequest,
}

impl HookKind {
    /// The capability bit that gates this hook.
    pub const fn capability(self) -> Capabilities {
        match self {
            Self::StartShouldSetResponderCapture => Capabilities::START_CAPTURE,
            Self::StartShouldSetResponder => Capabilities::START_CLAIM,
            Self::MoveShouldSetResponderCapture => Capabilities::MOVE_CAPTURE,
            Self::MoveShouldSetResponder => Capabilities::MOVE_CLAIM,
            Self::ResponderGrant => Capabilities::GRANT,
            Self::ResponderReject => Capabilities::REJECT,
            Self::ResponderStart => Capabilities::START,
            Self::ResponderMove => Capabilities::MOVE,
            Self::ResponderEnd => Capabilities::END,
            Self::ResponderRelease => Capabilities::RELEASE,
            Self::ResponderTerminate => Capabilities::TERMINATE,
            Self::ResponderTerminationRequest => Capabilities::TERMINATION_REQUEST,
        }
    }

    /// The documented property name, e.g. `onResponderGrant`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartShouldSetResponderCapture => "onStartShouldSetResponderCapture",
            Self::StartShouldSetResponder => "onStartShouldSetResponder",
            Self::MoveShouldSetResponderCapture => "onMoveShouldSetResponderCapture",
            Self::MoveShouldSetResponder => "onMoveShouldSetResponder",
            Self::ResponderGrant => "onResponderGrant",
            Self::ResponderReject => "onResponderReject",
            Self::ResponderStart => "onResponderStart",
            Self::ResponderMove => "onResponderMove",
            Self::ResponderEnd => "onResponderEnd",
            Self::ResponderRelease => "onResponderRelease",
            Self::ResponderTerminate => "onResponderTerminate",
            Self::ResponderTerminationRequest => "onResponderTerminationRequest",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The sample kinds that run a claim negotiation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Claim {
    /// First sample of a gesture.
    Start,
    /// A move sample.
    Move,
}

impl Claim {
    /// Predicate asked root → target.
    pub const fn capture_hook(self) -> ClaimHook {
        match self {
            Self::Start => ClaimHook::StartCapture,
            Self::Move => ClaimHook::MoveCapture,
        }
    }

    /// Predicate asked target → root.
    pub const fn bubble_hook(self) -> ClaimHook {
        match self {
            Self::Start => ClaimHook::Start,
            Self::Move => ClaimHook::Move,
        }
    }
}

/// One of the four "should set responder" predicates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClaimHook {
    /// `onStartShouldSetResponderCapture`.
    StartCapture,
    /// `onStartShouldSetResponder`.
    Start,
    /// `onMoveShouldSetResponderCapture`.
    MoveCapture,
    /// `onMoveShouldSetResponder`.
    Move,
}

impl ClaimHook {
    /// The corresponding [`HookKind`].
    pub const fn kind(self) -> HookKind {
        match self {
            Self::StartCapture => HookKind::StartShouldSetResponderCapture,
            Self::Start => HookKind::StartShouldSetResponder,
            Self::MoveCapture => HookKind::MoveShouldSetResponderCapture,
            Self::Move => HookKind::MoveShouldSetResponder,
        }
    }
}

/// Lifecycle notifications that carry no answer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Notification {
    /// A claim was refused because the holder would not yield.
    Reject,
    /// The responder saw the gesture's start sample.
    Start,
    /// The responder saw a move sample.
    Move,
    /// The responder saw the gesture's end sample.
    End,
    /// The gesture ended normally; the responder gave up the slot.
    Release,
    /// The responder lost the slot to another node, the platform, or a cancel.
    Terminate,
}

impl Notification {
    /// The corresponding [`HookKind`].
    pub const fn kind(self) -> HookKind {
        match self {
            Self::Reject => HookKind::ResponderReject,
            Self::Start => HookKind::ResponderStart,
            Self::Move => HookKind::ResponderMove,
            Self::End => HookKind::ResponderEnd,
            Self::Release => HookKind::ResponderRelease,
            Self::Terminate => HookKind::ResponderTerminate,
        }
    }
}

/// Answer of `onResponderGrant`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Grant {
    /// Take the slot.
    #[default]
    Accept,
    /// Give the slot back; negotiation is retried on the next sample.
    Decline,
}

/// Application callbacks consulted by the negotiator and the tracker.
///
/// Hooks run synchronously inside [`Tracker::on_sample`](crate::tracker::Tracker::on_sample)
/// and must not block. Work triggered by a notification that cannot complete immediately
/// should be queued by the application.
///
/// Methods are only called for nodes whose [`capabilities`](Self::capabilities) include the
/// matching bit.
pub trait ResponderHooks<K> {
    /// Hooks implemented by `node`. Unknown nodes report [`Capabilities::empty`].
    fn capabilities(&self, node: &K) -> Capabilities;

    /// One of the four claim predicates. Errors count as `false`.
    fn should_set_responder(
        &mut self,
        node: &K,
        hook: ClaimHook,
        event: &ResponderEvent<'_, K>,
    ) -> Result<bool, HookError>;

    /// `onResponderGrant`. Errors count as [`Grant::Decline`].
    fn grant(&mut self, node: &K, event: &ResponderEvent<'_, K>) -> Result<Grant, HookError> {
        let _ = (node, event);
        Ok(Grant::Accept)
    }

    /// `onResponderTerminationRequest`: `true` yields the slot. Errors count as `false`.
    fn termination_request(
        &mut self,
        node: &K,
        event: &ResponderEvent<'_, K>,
    ) -> Result<bool, HookError> {
        let _ = (node, event);
        Ok(false)
    }

    /// A lifecycle notification. Errors are reported to the caller of the tracker.
    fn notify(
        &mut self,
        node: &K,
        notification: Notification,
        event: &ResponderEvent<'_, K>,
    ) -> Result<(), HookError> {
        let _ = (node, notification, event);
        Ok(())
    }
}

type Predicate<K> = Box<dyn FnMut(&ResponderEvent<'_, K>) -> Result<bool, HookError>>;
type GrantFn<K> = Box<dyn FnMut(&ResponderEvent<'_, K>) -> Result<Grant, HookError>>;
type NotifyFn<K> = Box<dyn FnMut(&ResponderEvent<'_, K>) -> Result<(), HookError>>;

/// Closures for one node. Build with the `on_*` methods, then [`HookSet::register`].
pub struct NodeHooks<K> {
    capabilities: Capabilities,
    start_capture: Option<Predicate<K>>,
    start_claim: Option<Predicate<K>>,
    move_capture: Option<Predicate<K>>,
    move_claim: Option<Predicate<K>>,
    termination_request: Option<Predicate<K>>,
    grant: Option<GrantFn<K>>,
    reject: Option<NotifyFn<K>>,
    start: Option<NotifyFn<K>>,
    moved: Option<NotifyFn<K>>,
    end: Option<NotifyFn<K>>,
    release: Option<NotifyFn<K>>,
    terminate: Option<NotifyFn<K>>,
}

impl<K> fmt::Debug for NodeHooks<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHooks")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<K> Default for NodeHooks<K> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! hook_setter {
    ($(#[$doc:meta])* $name:ident, $field:ident, $cap:ident, $ty:ident, $ret:ty) => {
        $(#[$doc])*
        pub fn $name(
            mut self,
            f: impl FnMut(&ResponderEvent<'_, K>) -> Result<$ret, HookError> + 'static,
        ) -> Self {
            self.$field = Some(Box::new(f) as $ty<K>);
            self.capabilities |= Capabilities::$cap;
            self
        }
    };
}

impl<K> NodeHooks<K> {
    /// No hooks.
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::empty(),
            start_capture: None,
            start_claim: None,
            move_capture: None,
            move_claim: None,
            termination_request: None,
            grant: None,
            reject: None,
            start: None,
            moved: None,
            end: None,
            release: None,
            terminate: None,
        }
    }

    /// Hooks present on this node.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    hook_setter!(
        /// `onStartShouldSetResponderCapture`.
        on_start_should_set_responder_capture, start_capture, START_CAPTURE, Predicate, bool
    );
    hook_setter!(
        /// `onStartShouldSetResponder`.
        on_start_should_set_responder, start_claim, START_CLAIM, Predicate, bool
    );
    hook_setter!(
        /// `onMoveShouldSetResponderCapture`.
        on_move_should_set_responder_capture, move_capture, MOVE_CAPTURE, Predicate, bool
    );
    hook_setter!(
        /// `onMoveShouldSetResponder`.
        on_move_should_set_responder, move_claim, MOVE_CLAIM, Predicate, bool
    );
    hook_setter!(
        /// `onResponderTerminationRequest`.
        on_responder_termination_request, termination_request, TERMINATION_REQUEST, Predicate, bool
    );
    hook_setter!(
        /// `onResponderGrant`.
        on_responder_grant, grant, GRANT, GrantFn, Grant
    );
    hook_setter!(
        /// `onResponderReject`.
        on_responder_reject, reject, REJECT, NotifyFn, ()
    );
    hook_setter!(
        /// `onResponderStart`.
        on_responder_start, start, START, NotifyFn, ()
    );
    hook_setter!(
        /// `onResponderMove`.
        on_responder_move, moved, MOVE, NotifyFn, ()
    );
    hook_setter!(
        /// `onResponderEnd`.
        on_responder_end, end, END, NotifyFn, ()
    );
    hook_setter!(
        /// `onResponderRelease`.
        on_responder_release, release, RELEASE, NotifyFn, ()
    );
    hook_setter!(
        /// `onResponderTerminate`.
        on_responder_terminate, terminate, TERMINATE, NotifyFn, ()
    );
}

/// Per-node closures keyed by node identifier.
pub struct HookSet<K> {
    nodes: HashMap<K, NodeHooks<K>>,
}

impl<K> fmt::Debug for HookSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSet")
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash> Default for HookSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> HookSet<K> {
    /// An empty set.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Register (or replace) the hooks of `node`. Returns the replaced hooks, if any.
    pub fn register(&mut self, node: K, hooks: NodeHooks<K>) -> Option<NodeHooks<K>> {
        self.nodes.insert(node, hooks)
    }

    /// Remove the hooks of `node`.
    pub fn unregister(&mut self, node: &K) -> Option<NodeHooks<K>> {
        self.nodes.remove(node)
    }

    /// Number of nodes with hooks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node has hooks.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<K: Eq + Hash> ResponderHooks<K> for HookSet<K> {
    fn capabilities(&self, node: &K) -> Capabilities {
        self.nodes
            .get(node)
            .map(NodeHooks::capabilities)
            .unwrap_or_default()
    }

    fn should_set_responder(
        &mut self,
        node: &K,
        hook: ClaimHook,
        event: &ResponderEvent<'_, K>,
    ) -> Result<bool, HookError> {
        let Some(hooks) = self.nodes.get_mut(node) else {
            return Ok(false);
        };
        let predicate = match hook {
            ClaimHook::StartCapture => hooks.start_capture.as_mut(),
            ClaimHook::Start => hooks.start_claim.as_mut(),
            ClaimHook::MoveCapture => hooks.move_capture.as_mut(),
            ClaimHook::Move => hooks.move_claim.as_mut(),
        };
        predicate.map_or(Ok(false), |f| f(event))
    }

    fn grant(&mut self, node: &K, event: &ResponderEvent<'_, K>) -> Result<Grant, HookError> {
        match self.nodes.get_mut(node).and_then(|h| h.grant.as_mut()) {
            Some(f) => f(event),
            None => Ok(Grant::Accept),
        }
    }

    fn termination_request(
        &mut self,
        node: &K,
        event: &ResponderEvent<'_, K>,
    ) -> Result<bool, HookError> {
        match self
            .nodes
            .get_mut(node)
            .and_then(|h| h.termination_request.as_mut())
        {
            Some(f) => f(event),
            None => Ok(false),
        }
    }

    fn notify(
        &mut self,
        node: &K,
        notification: Notification,
        event: &ResponderEvent<'_, K>,
    ) -> Result<(), HookError> {
        let Some(hooks) = self.nodes.get_mut(node) else {
            return Ok(());
        };
        let f = match notification {
            Notification::Reject => hooks.reject.as_mut(),
            Notification::Start => hooks.start.as_mut(),
            Notification::Move => hooks.moved.as_mut(),
            Notification::End => hooks.end.as_mut(),
            Notification::Release => hooks.release.as_mut(),
            Notification::Terminate => hooks.terminate.as_mut(),
        };
        f.map_or(Ok(()), |f| f(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeviceId, GestureId, PointerSample, SamplePhase};
    use alloc::rc::Rc;
    use alloc::string::ToString;
    use core::cell::Cell;
    use kurbo::Point;

    fn sample() -> PointerSample {
        PointerSample::new(
            DeviceId::touch(0),
            SamplePhase::Start,
            Point::new(1.0, 2.0),
            10,
        )
    }

    #[test]
    fn capabilities_follow_registered_closures() {
        let hooks: NodeHooks<u32> = NodeHooks::new()
            .on_move_should_set_responder_capture(|_| Ok(false))
            .on_responder_grant(|_| Ok(Grant::Decline))
            .on_responder_termination_request(|_| Ok(true));
        assert_eq!(
            hooks.capabilities(),
            Capabilities::MOVE_CAPTURE | Capabilities::GRANT | Capabilities::TERMINATION_REQUEST
        );
    }

    #[test]
    fn every_hook_kind_has_a_distinct_capability() {
        let kinds = [
            HookKind::StartShouldSetResponderCapture,
            HookKind::StartShouldSetResponder,
            HookKind::MoveShouldSetResponderCapture,
            HookKind::MoveShouldSetResponder,
            HookKind::ResponderGrant,
            HookKind::ResponderReject,
            HookKind::ResponderStart,
            HookKind::ResponderMove,
            HookKind::ResponderEnd,
            HookKind::ResponderRelease,
            HookKind::ResponderTerminate,
            HookKind::ResponderTerminationRequest,
        ];
        let mut seen = Capabilities::empty();
        for kind in kinds {
            assert!(!seen.intersects(kind.capability()), "{kind} shares a bit");
            seen |= kind.capability();
        }
        assert_eq!(seen, Capabilities::all());
    }

    #[test]
    fn hook_set_routes_calls_to_the_registered_node() {
        let moves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&moves);
        let mut set: HookSet<u32> = HookSet::new();
        set.register(
            1,
            NodeHooks::new()
                .on_start_should_set_responder(|_| Ok(true))
                .on_responder_move(move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                }),
        );

        let s = sample();
        let history = [s];
        let ev = ResponderEvent {
            gesture: GestureId(1),
            sample: &s,
            target: Some(1),
            responder: None,
            history: &history,
        };
        assert_eq!(set.should_set_responder(&1, ClaimHook::Start, &ev), Ok(true));
        assert_eq!(
            set.should_set_responder(&1, ClaimHook::StartCapture, &ev),
            Ok(false)
        );
        assert_eq!(set.should_set_responder(&2, ClaimHook::Start, &ev), Ok(false));
        set.notify(&1, Notification::Move, &ev).unwrap();
        set.notify(&2, Notification::Move, &ev).unwrap();
        assert_eq!(moves.get(), 1);
        assert_eq!(set.grant(&1, &ev), Ok(Grant::Accept));
        assert_eq!(set.termination_request(&1, &ev), Ok(false));

        assert!(set.unregister(&1).is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn hook_kind_names_match_documented_props() {
        assert_eq!(HookKind::ResponderGrant.to_string(), "onResponderGrant");
        assert_eq!(
            Claim::Move.capture_hook().kind().name(),
            "onMoveShouldSetResponderCapture"
        );
        assert_eq!(
            Notification::Terminate.kind(),
            HookKind::ResponderTerminate
        );
    }
}
