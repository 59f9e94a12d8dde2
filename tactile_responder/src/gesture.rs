// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture records: one per live device interaction.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::types::{DeviceId, GestureId, PointerSample};

/// Where a gesture is in its life.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// Created from a start sample; negotiation has not run yet.
    Idle,
    /// Live without a responder. Every move sample renegotiates.
    Negotiating,
    /// Live with a responder.
    Active,
    /// Ended or cancelled. The record is discarded once the sample is handled.
    Terminating,
}

/// One gesture: the samples of a device from start to end or cancel.
#[derive(Clone, Debug)]
pub struct Gesture<K> {
    id: GestureId,
    device: DeviceId,
    phase: GesturePhase,
    origin: Arc<[K]>,
    samples: Vec<PointerSample>,
    limit: Option<usize>,
}

impl<K> Gesture<K> {
    pub(crate) fn new(
        id: GestureId,
        first: PointerSample,
        origin: Arc<[K]>,
        limit: Option<usize>,
    ) -> Self {
        let mut samples = Vec::with_capacity(8);
        samples.push(first);
        Self {
            id,
            device: first.device,
            phase: GesturePhase::Idle,
            origin,
            samples,
            limit: limit.map(|n| n.max(1)),
        }
    }

    /// Identifier.
    pub fn id(&self) -> GestureId {
        self.id
    }

    /// Device that owns this gesture.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Current phase.
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Root → target path hit by the start sample. Empty if the start sample hit nothing.
    pub fn origin(&self) -> &Arc<[K]> {
        &self.origin
    }

    /// Recorded samples, oldest first.
    pub fn samples(&self) -> &[PointerSample] {
        &self.samples
    }

    /// The most recent sample.
    pub fn last_sample(&self) -> &PointerSample {
        // Construction always records the start sample and trimming keeps at least one.
        &self.samples[self.samples.len() - 1]
    }

    pub(crate) fn set_phase(&mut self, phase: GesturePhase) {
        self.phase = phase;
    }

    pub(crate) fn record(&mut self, sample: PointerSample) {
        self.samples.push(sample);
        if let Some(limit) = self.limit {
            let excess = self.samples.len().saturating_sub(limit);
            if excess > 0 {
                self.samples.drain(..excess);
            }
        }
    }
}
