// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction tracker: per-device gestures and responder slots.
//!
//! The tracker consumes platform samples in arrival order. For every device it keeps at
//! most one live [`Gesture`] and one [`ResponderSlot`], runs negotiation on start and move
//! samples, and streams the lifecycle notifications to the settled responder.
//!
//! ## Usage
//!
//! ```
//! use kurbo::Point;
//! use tactile_responder::config::TrackerConfig;
//! use tactile_responder::hooks::{HookSet, NodeHooks};
//! use tactile_responder::tracker::Tracker;
//! use tactile_responder::types::{DeviceId, HitTest, ParentLookup, PointerSample, SamplePhase};
//!
//! // A one-node "view": everything hits node 1.
//! struct Flat;
//! impl HitTest<u32> for Flat {
//!     fn hit_test(&self, _: Point) -> Option<u32> { Some(1) }
//! }
//! impl ParentLookup<u32> for Flat {
//!     fn parent_of(&self, _: &u32) -> Option<u32> { None }
//! }
//!
//! let mut hooks = HookSet::new();
//! hooks.register(1, NodeHooks::new().on_start_should_set_responder(|_| Ok(true)));
//!
//! let mut tracker = Tracker::new(TrackerConfig::default());
//! let finger = DeviceId::touch(0);
//! let down = PointerSample::new(finger, SamplePhase::Start, Point::new(5.0, 5.0), 0);
//! let report = tracker.on_sample(&Flat, &mut hooks, down).unwrap();
//! assert_eq!(report.responder, Some(1));
//!
//! let up = PointerSample::new(finger, SamplePhase::End, Point::new(5.0, 5.0), 16);
//! tracker.on_sample(&Flat, &mut hooks, up).unwrap();
//! assert_eq!(tracker.responder(finger), None);
//! ```
//!
//! ## Sample rules
//!
//! 1. **Start**: hit test, create the gesture, negotiate with the start predicates. A new
//!    responder receives `onResponderGrant` then `onResponderStart`.
//! 2. **Move**: hit test again at the new point (a miss falls back to the gesture's origin
//!    path), negotiate with the move predicates, then send `onResponderMove` to whoever holds
//!    the slot.
//! 3. **End**: `onResponderEnd` then `onResponderRelease` to the responder; the gesture is
//!    discarded.
//! 4. **Cancel**: `onResponderTerminate` to the responder, no negotiation; the gesture is
//!    discarded.
//!
//! End and cancel samples for a gesture nobody owns are discarded quietly. Samples that do
//! not fit the device's state (a move with no live gesture, a second start, a timestamp
//! going backwards) are dropped with [`TrackerError::Malformed`] and change nothing.

use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::config::TrackerConfig;
use crate::error::{MalformedSample, TrackerError};
use crate::gesture::{Gesture, GesturePhase};
use crate::hooks::{Claim, Grant, Notification, ResponderHooks};
use crate::negotiator::{Delivery, Negotiation, Negotiator, Transcript, reconstruct_path};
use crate::slot::ResponderSlot;
use crate::types::{
    DeviceId, GestureId, HitTest, ParentLookup, PointerSample, ResponderEvent, SamplePhase,
};

/// What one sample (or forced takeover) did.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleReport<K> {
    /// Device the sample came from.
    pub device: DeviceId,
    /// Gesture the sample belonged to.
    pub gesture: GestureId,
    /// Gesture phase after the sample. [`GesturePhase::Terminating`] means the gesture is gone.
    pub phase: GesturePhase,
    /// Responder after the sample.
    pub responder: Option<K>,
    /// Node hit by the sample, if any.
    pub target: Option<K>,
    /// Negotiation outcome, for samples that negotiate.
    pub negotiation: Option<Negotiation<K>>,
    /// Lifecycle hooks addressed, in order.
    pub deliveries: SmallVec<[Delivery<K>; 4]>,
    /// Root → target path of the gesture's start sample.
    ///
    /// Use with [`touch::dispatch_sequence`](crate::touch::dispatch_sequence) to emit raw
    /// touch handlers.
    pub origin: Arc<[K]>,
}

#[derive(Clone, Debug)]
struct DeviceState<K> {
    gesture: Gesture<K>,
    slot: ResponderSlot<K>,
}

/// Per-device gesture tracker.
#[derive(Clone, Debug)]
pub struct Tracker<K> {
    config: TrackerConfig,
    negotiator: Negotiator,
    devices: BTreeMap<DeviceId, DeviceState<K>>,
    next_gesture: u64,
}

impl<K: Copy + PartialEq + fmt::Debug> Default for Tracker<K> {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl<K: Copy + PartialEq + fmt::Debug> Tracker<K> {
    /// A tracker with no live gestures.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            negotiator: Negotiator::new(&config),
            devices: BTreeMap::new(),
            next_gesture: 1,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current responder of `device`.
    pub fn responder(&self, device: DeviceId) -> Option<K> {
        self.devices.get(&device).and_then(|s| s.slot.holder())
    }

    /// Live gesture of `device`.
    pub fn gesture(&self, device: DeviceId) -> Option<&Gesture<K>> {
        self.devices.get(&device).map(|s| &s.gesture)
    }

    /// Devices with a live gesture, in ascending order.
    pub fn live_devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.keys().copied()
    }

    /// Handle one platform sample.
    ///
    /// Returns [`TrackerError::HookFailed`] when the sample was applied but notification
    /// hooks failed; the embedded report is the same one the `Ok` path would carry.
    pub fn on_sample<V, H>(
        &mut self,
        view: &V,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        V: HitTest<K> + ParentLookup<K> + ?Sized,
        H: ResponderHooks<K> + ?Sized,
    {
        tracing::trace!(
            device = %sample.device,
            phase = ?sample.phase,
            x = sample.point.x,
            y = sample.point.y,
            timestamp = sample.timestamp,
            "sample"
        );
        match sample.phase {
            SamplePhase::Start => self.start(view, hooks, sample),
            SamplePhase::Move => self.moved(view, hooks, sample),
            SamplePhase::End => self.end(hooks, sample),
            SamplePhase::Cancel => self.cancel(hooks, sample),
        }
    }

    /// Take the slot of `device` away from its responder, regardless of its hooks.
    ///
    /// The responder receives exactly one `onResponderTerminate`. With `new_owner`, the slot is
    /// then offered to that node (it may decline, leaving the gesture unowned). Without one,
    /// the gesture ends: the platform owns the interaction, and further samples from the
    /// device are rejected until its next start.
    pub fn force_takeover<H>(
        &mut self,
        device: DeviceId,
        hooks: &mut H,
        new_owner: Option<K>,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        let Some(state) = self.devices.get_mut(&device) else {
            return Err(malformed(device, MalformedSample::NothingToTakeOver));
        };
        let DeviceState { gesture, slot } = state;
        let last = *gesture.last_sample();
        let target = gesture.origin().last().copied();
        let mut transcript = Transcript::new();
        let ev = ResponderEvent {
            gesture: gesture.id(),
            sample: &last,
            target,
            responder: slot.holder(),
            history: gesture.samples(),
        };
        let (previous, grant) =
            self.negotiator
                .force_takeover(slot, new_owner, hooks, &ev, &mut transcript);
        let negotiation = match (new_owner, grant) {
            (Some(node), Some(Grant::Accept)) => match previous {
                Some(previous) => Negotiation::Transferred { node, previous },
                None => Negotiation::Granted { node },
            },
            (Some(node), _) => Negotiation::Declined { node },
            (None, _) => Negotiation::Unclaimed,
        };

        if new_owner.is_none() {
            gesture.set_phase(GesturePhase::Terminating);
            tracing::debug!(%device, gesture = gesture.id().get(), "gesture ended by takeover");
            let report = finish(device, gesture, None, target, Some(negotiation), transcript);
            self.devices.remove(&device);
            return report;
        }
        gesture.set_phase(phase_for(slot));
        finish(
            device,
            gesture,
            slot.holder(),
            target,
            Some(negotiation),
            transcript,
        )
    }

    /// Cancel every live gesture, in ascending device order.
    ///
    /// Each device behaves as if it had received a cancel sample at its latest position.
    pub fn cancel_all<H>(&mut self, hooks: &mut H) -> Vec<Result<SampleReport<K>, TrackerError<K>>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        let cancels: Vec<PointerSample> = self
            .devices
            .values()
            .map(|s| {
                let last = s.gesture.last_sample();
                PointerSample::new(last.device, SamplePhase::Cancel, last.point, last.timestamp)
            })
            .collect();
        cancels
            .into_iter()
            .map(|sample| self.cancel(hooks, sample))
            .collect()
    }

    fn start<V, H>(
        &mut self,
        view: &V,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        V: HitTest<K> + ParentLookup<K> + ?Sized,
        H: ResponderHooks<K> + ?Sized,
    {
        let device = sample.device;
        if let Some(state) = self.devices.get(&device) {
            return Err(malformed(
                device,
                MalformedSample::DuplicateStart {
                    gesture: state.gesture.id(),
                },
            ));
        }

        let target = view.hit_test(sample.point);
        let origin: Arc<[K]> = match target {
            Some(t) => Arc::from(reconstruct_path(t, view)),
            None => Arc::from(Vec::new()),
        };
        let id = GestureId(self.next_gesture);
        self.next_gesture += 1;
        let mut gesture = Gesture::new(id, sample, Arc::clone(&origin), self.config.sample_history);
        let mut slot = ResponderSlot::new();
        let mut transcript = Transcript::new();
        tracing::debug!(%device, gesture = id.get(), target = ?target, "gesture started");

        let ev = ResponderEvent {
            gesture: id,
            sample: &sample,
            target,
            responder: None,
            history: gesture.samples(),
        };
        let negotiation =
            self.negotiator
                .negotiate(Claim::Start, &origin, &mut slot, hooks, &ev, &mut transcript);
        if let Some(responder) = slot.holder() {
            transcript.notify(hooks, responder, Notification::Start, &ev);
        }
        gesture.set_phase(phase_for(&slot));

        let report = finish(
            device,
            &gesture,
            slot.holder(),
            target,
            Some(negotiation),
            transcript,
        );
        self.devices.insert(device, DeviceState { gesture, slot });
        report
    }

    fn moved<V, H>(
        &mut self,
        view: &V,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        V: HitTest<K> + ParentLookup<K> + ?Sized,
        H: ResponderHooks<K> + ?Sized,
    {
        let device = sample.device;
        validate(&self.devices, &sample, true)?;
        let Some(DeviceState { gesture, slot }) = self.devices.get_mut(&device) else {
            return Err(malformed(
                device,
                MalformedSample::NoLiveGesture {
                    phase: sample.phase,
                },
            ));
        };
        gesture.record(sample);

        let hit = view.hit_test(sample.point);
        let path: Cow<'_, [K]> = match hit {
            Some(t) => Cow::Owned(reconstruct_path(t, view)),
            None => Cow::Borrowed(&gesture.origin()[..]),
        };
        let target = path.last().copied();
        let mut transcript = Transcript::new();
        let ev = ResponderEvent {
            gesture: gesture.id(),
            sample: &sample,
            target,
            responder: slot.holder(),
            history: gesture.samples(),
        };
        let negotiation =
            self.negotiator
                .negotiate(Claim::Move, &path, slot, hooks, &ev, &mut transcript);
        if let Some(responder) = slot.holder() {
            transcript.notify(hooks, responder, Notification::Move, &ev);
        }
        drop(path);
        gesture.set_phase(phase_for(slot));
        finish(
            device,
            gesture,
            slot.holder(),
            target,
            Some(negotiation),
            transcript,
        )
    }

    fn end<H>(
        &mut self,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        self.finish_gesture(hooks, sample, true, &[Notification::End, Notification::Release])
    }

    fn cancel<H>(
        &mut self,
        hooks: &mut H,
        sample: PointerSample,
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        // A cancel is honored even when its timestamp lags behind.
        self.finish_gesture(hooks, sample, false, &[Notification::Terminate])
    }

    fn finish_gesture<H>(
        &mut self,
        hooks: &mut H,
        sample: PointerSample,
        check_order: bool,
        notifications: &[Notification],
    ) -> Result<SampleReport<K>, TrackerError<K>>
    where
        H: ResponderHooks<K> + ?Sized,
    {
        let device = sample.device;
        validate(&self.devices, &sample, check_order)?;
        let Some(DeviceState {
            mut gesture,
            mut slot,
        }) = self.devices.remove(&device)
        else {
            return Err(malformed(
                device,
                MalformedSample::NoLiveGesture {
                    phase: sample.phase,
                },
            ));
        };
        gesture.record(sample);
        gesture.set_phase(GesturePhase::Terminating);

        let mut transcript = Transcript::new();
        let target = gesture.origin().last().copied();
        match slot.holder() {
            Some(responder) => {
                let ev = ResponderEvent {
                    gesture: gesture.id(),
                    sample: &sample,
                    target,
                    responder: Some(responder),
                    history: gesture.samples(),
                };
                for &notification in notifications {
                    transcript.notify(hooks, responder, notification, &ev);
                }
                slot.clear();
                tracing::debug!(
                    %device,
                    gesture = gesture.id().get(),
                    responder = ?responder,
                    phase = ?sample.phase,
                    "responder released"
                );
            }
            None => {
                tracing::trace!(%device, gesture = gesture.id().get(), "unowned gesture discarded");
            }
        }
        finish(device, &gesture, None, target, None, transcript)
    }
}

fn phase_for<K: Copy + PartialEq>(slot: &ResponderSlot<K>) -> GesturePhase {
    if slot.is_empty() {
        GesturePhase::Negotiating
    } else {
        GesturePhase::Active
    }
}

fn validate<K>(
    devices: &BTreeMap<DeviceId, DeviceState<K>>,
    sample: &PointerSample,
    check_order: bool,
) -> Result<(), TrackerError<K>> {
    let Some(state) = devices.get(&sample.device) else {
        return Err(malformed(
            sample.device,
            MalformedSample::NoLiveGesture {
                phase: sample.phase,
            },
        ));
    };
    let previous = state.gesture.last_sample().timestamp;
    if check_order && sample.timestamp < previous {
        return Err(malformed(
            sample.device,
            MalformedSample::OutOfOrder {
                timestamp: sample.timestamp,
                previous,
            },
        ));
    }
    Ok(())
}

fn malformed<K>(device: DeviceId, reason: MalformedSample) -> TrackerError<K> {
    tracing::warn!(%device, %reason, "dropping malformed sample");
    TrackerError::Malformed { device, reason }
}

fn finish<K: Copy>(
    device: DeviceId,
    gesture: &Gesture<K>,
    responder: Option<K>,
    target: Option<K>,
    negotiation: Option<Negotiation<K>>,
    transcript: Transcript<K>,
) -> Result<SampleReport<K>, TrackerError<K>> {
    let (deliveries, failures) = transcript.into_parts();
    let report = SampleReport {
        device,
        gesture: gesture.id(),
        phase: gesture.phase(),
        responder,
        target,
        negotiation,
        deliveries,
        origin: Arc::clone(gesture.origin()),
    };
    if failures.is_empty() {
        Ok(report)
    } else {
        Err(TrackerError::HookFailed { failures, report })
    }
}
