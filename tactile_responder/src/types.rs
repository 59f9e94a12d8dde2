// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: input samples, device and gesture identifiers, propagation entries,
//! and the lookup traits the tracker consumes.

use core::fmt;

use kurbo::Point;

/// Kind of input device that produced a sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKind {
    /// A finger on a touch surface.
    Touch,
    /// A mouse or trackpad pointer.
    Mouse,
    /// A stylus.
    Pen,
}

/// Identifies one input device (one finger, one mouse, one stylus).
///
/// Every device owns an independent responder slot. Mouse and touch gestures that target the
/// same view negotiate independently.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    /// Device kind.
    pub kind: DeviceKind,
    /// Platform identifier, unique within `kind`.
    pub id: u32,
}

impl DeviceId {
    /// Touch point `id`.
    pub const fn touch(id: u32) -> Self {
        Self {
            kind: DeviceKind::Touch,
            id,
        }
    }

    /// Mouse `id`.
    pub const fn mouse(id: u32) -> Self {
        Self {
            kind: DeviceKind::Mouse,
            id,
        }
    }

    /// Pen `id`.
    pub const fn pen(id: u32) -> Self {
        Self {
            kind: DeviceKind::Pen,
            id,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DeviceKind::Touch => "touch",
            DeviceKind::Mouse => "mouse",
            DeviceKind::Pen => "pen",
        };
        write!(f, "{kind}#{}", self.id)
    }
}

/// Phase of a platform sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SamplePhase {
    /// Pointer went down / touch began.
    Start,
    /// Pointer moved while down.
    Move,
    /// Pointer lifted.
    End,
    /// The platform aborted the interaction (e.g. app backgrounded).
    Cancel,
}

/// One platform pointer or touch sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerSample {
    /// Originating device.
    pub device: DeviceId,
    /// Sample phase.
    pub phase: SamplePhase,
    /// Position in world (root) coordinates.
    pub point: Point,
    /// Platform timestamp, in milliseconds. Must not decrease within a gesture.
    pub timestamp: u64,
}

impl PointerSample {
    /// Create a sample.
    pub fn new(device: DeviceId, phase: SamplePhase, point: Point, timestamp: u64) -> Self {
        Self {
            device,
            phase,
            point,
            timestamp,
        }
    }
}

/// Unique identifier of a gesture, allocated by the tracker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(pub(crate) u64);

impl GestureId {
    /// Raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// What the hooks see for each call: the sample, its gesture, and who holds the slot.
#[derive(Copy, Clone, Debug)]
pub struct ResponderEvent<'a, K> {
    /// Gesture this sample belongs to.
    pub gesture: GestureId,
    /// The sample being processed.
    pub sample: &'a PointerSample,
    /// Node under the sample (falls back to the gesture's origin when nothing is hit).
    pub target: Option<K>,
    /// Current holder of the device's responder slot, before this sample is applied.
    pub responder: Option<K>,
    /// Samples recorded for the gesture so far, oldest first, including this one.
    pub history: &'a [PointerSample],
}

/// Propagation phase for a node in a dispatch sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root → target, excluding the target.
    Capture,
    /// The target itself.
    Target,
    /// Target → root, excluding the target.
    Bubble,
}

/// Handler result controlling propagation in [`crate::dispatcher::run`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep propagating.
    Continue,
    /// Abort propagation immediately.
    Stop,
}

/// One step of a capture → target → bubble sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch<K, M> {
    /// Propagation phase.
    pub phase: Phase,
    /// Node to invoke.
    pub node: K,
    /// Payload carried with every step.
    pub meta: M,
}

/// Parent lookup used to rebuild a root→node chain when only a node is known.
pub trait ParentLookup<K> {
    /// Return the parent of `node`, or `None` for roots.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// Hit testing as seen by the tracker.
pub trait HitTest<K> {
    /// Return the deepest eligible node under `point`, or `None`.
    fn hit_test(&self, point: Point) -> Option<K>;
}
