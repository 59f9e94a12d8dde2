// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types reported by hooks and by the tracker.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::hooks::HookKind;
use crate::tracker::SampleReport;
use crate::types::{DeviceId, GestureId, SamplePhase};

/// Failure raised by an application hook.
///
/// Predicate, grant, and termination-request failures are treated as a negative answer.
/// Notification failures are collected and returned with the sample's report.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    message: Cow<'static, str>,
}

impl HookError {
    /// Create an error with a message.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A hook failure, attributed to the node and hook that raised it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{hook} on {node:?} failed")]
pub struct HookFailure<K> {
    /// Node whose hook failed.
    pub node: K,
    /// Which hook.
    pub hook: HookKind,
    /// The hook's error.
    pub source: HookError,
}

/// Why a sample was dropped without touching any state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedSample {
    /// A move, end, or cancel arrived for a device with no live gesture.
    #[error("{phase:?} sample without a live gesture")]
    NoLiveGesture {
        /// Phase of the dropped sample.
        phase: SamplePhase,
    },
    /// A start arrived while the device's previous gesture is still live.
    #[error("start sample while gesture {} is live", .gesture.get())]
    DuplicateStart {
        /// The live gesture.
        gesture: GestureId,
    },
    /// The timestamp is earlier than the gesture's latest sample.
    #[error("timestamp {timestamp} is earlier than the previous sample at {previous}")]
    OutOfOrder {
        /// Timestamp of the dropped sample.
        timestamp: u64,
        /// Timestamp of the gesture's latest sample.
        previous: u64,
    },
    /// A forced takeover named a device with no live gesture.
    #[error("no live gesture to take over")]
    NothingToTakeOver,
    /// A device tried to take over its own gesture.
    #[error("a device cannot take over its own gesture")]
    SelfTakeover,
}

/// Errors returned by [`Tracker`](crate::tracker::Tracker).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError<K> {
    /// The sample was dropped; tracker state is unchanged.
    #[error("dropped sample from {device}: {reason}")]
    Malformed {
        /// Device that sent the sample.
        device: DeviceId,
        /// What was wrong with it.
        reason: MalformedSample,
    },
    /// The sample was fully applied, but one or more notification hooks failed.
    ///
    /// The report describes the state after the sample, exactly as the `Ok` path would.
    #[error("{} hook(s) failed while handling a sample from {}", .failures.len(), .report.device)]
    HookFailed {
        /// Failures, in the order the hooks ran.
        failures: Vec<HookFailure<K>>,
        /// What the sample did.
        report: SampleReport<K>,
    },
}

impl<K> TrackerError<K> {
    /// The report of an applied sample, if the sample was applied.
    pub fn report(&self) -> Option<&SampleReport<K>> {
        match self {
            Self::Malformed { .. } => None,
            Self::HookFailed { report, .. } => Some(report),
        }
    }
}
