// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tracker shared between input threads.
//!
//! Platforms that deliver mouse, pen, and touch samples on different threads can feed one
//! [`SharedTracker`]. Each call holds the lock for the whole sample, so one device can take
//! over another device's gesture without racing the other device's samples.

use alloc::vec::Vec;
use core::fmt;

use parking_lot::Mutex;

use crate::config::TrackerConfig;
use crate::error::{MalformedSample, TrackerError};
use crate::hooks::ResponderHooks;
use crate::tracker::{SampleReport, Tracker};
use crate::types::{DeviceId, HitTest, ParentLookup, PointerSample};

/// A [`Tracker`] behind a [`parking_lot::Mutex`].
pub struct SharedTracker<K> {
    inner: Mutex<Tracker<K>>,
}

impl<K: fmt::Debug> fmt::Debug for SharedTracker<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(tracker) => f.debug_struct("SharedTracker").field("inner", &*tracker).finish(),
            None => f.debug_struct("SharedTracker").finish_non_exhaustive(),
        }
    }
}

impl<K: Copy + PartialEq + fmt::Debug> Default for SharedTracker<K> {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<K: Copy + PartialEq + fmt::Debug> SharedTracker<K> {
    /// A shared tracker with no live gestures.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            inner: Mutex::new(Tracker::new(config)),
        }
    }

    /// See [`Tracker::on_sample`].
    pub fn on_sample<V, H>(
        &self,
        view: &V,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        V: HitTest<K> + ParentLookup<K> + ?Sized,
        H: ResponderHooks<K> + ?Sized,
    {
        self.inner.lock().on_sample(view, hooks, sample)
    }

    /// Let `by` take over the gesture of `victim`.
    ///
    /// The victim's responder is terminated. If `by` has a responder, that node is offered the
    /// victim's slot as well; otherwise the victim's gesture ends. A device cannot take over
    /// its own gesture: `victim == by` is rejected as [`MalformedSample::SelfTakeover`] and
    /// changes nothing.
    pub fn take_over<H>(
        &self,
        victim: DeviceId,
        by: DeviceId,
        hooks: &mut H,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        if victim == by {
            let reason = MalformedSample::SelfTakeover;
            tracing::warn!(device = %victim, %reason, "dropping takeover");
            return Err(TrackerError::Malformed {
                device: victim,
                reason,
            });
        }
        let mut tracker = self.inner.lock();
        let new_owner = tracker.responder(by);
        tracing::debug!(%victim, %by, new_owner = ?new_owner, "cross-device takeover");
        tracker.force_takeover(victim, hooks, new_owner)
    }

    /// See [`Tracker::force_takeover`].
    pub fn force_takeover<H>(
        &self,
        device: DeviceId,
        hooks: &mut H,
        new_owner: Option<K>,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        self.inner.lock().force_takeover(device, hooks, new_owner)
    }

    /// See [`Tracker::cancel_all`].
    pub fn cancel_all<H>(&self, hooks: &mut H) -> Vec<Result<SampleReport<K>, TrackerError<K>>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        self.inner.lock().cancel_all(hooks)
    }

    /// Current responder of `device`.
    pub fn responder(&self, device: DeviceId) -> Option<K> {
        self.inner.lock().responder(device)
    }

    /// Run `f` with exclusive access to the tracker.
    pub fn with<R>(&self, f: impl FnOnce(&mut Tracker<K>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Unwrap the tracker.
    pub fn into_inner(self) -> Tracker<K> {
        self.inner.into_inner()
    }
}
