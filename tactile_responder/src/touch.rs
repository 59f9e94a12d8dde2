// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw touch propagation: `onTouchStart`, `onTouchMove`, `onTouchEnd`, `onTouchCancel`.
//!
//! Independent of responder negotiation, every node on a gesture's origin path may observe
//! the raw touch stream. [`dispatch_sequence`] emits the capture → target → bubble order for
//! one sample, and [`dispatcher::run`](crate::dispatcher::run) walks it.
//!
//! ```
//! use tactile_responder::touch::{dispatch_sequence, handler_name};
//! use tactile_responder::types::SamplePhase;
//!
//! let seq = dispatch_sequence(&[1_u32, 2, 3], SamplePhase::Start);
//! let names: Vec<(&str, u32)> = seq.iter().map(|d| (handler_name(d), d.node)).collect();
//! assert_eq!(
//!     names,
//!     [
//!         ("onTouchStartCapture", 1),
//!         ("onTouchStartCapture", 2),
//!         ("onTouchStart", 3),
//!         ("onTouchStart", 2),
//!         ("onTouchStart", 1),
//!     ]
//! );
//! ```

use alloc::vec::Vec;

use crate::types::{Dispatch, Phase, SamplePhase};

/// One raw touch handler invocation; `meta` is the sample phase.
pub type TouchDispatch<K> = Dispatch<K, SamplePhase>;

/// Capture → target → bubble entries for `path` (root → target).
///
/// The target appears once, in [`Phase::Target`]. An empty path yields no entries.
pub fn dispatch_sequence<K: Copy>(path: &[K], phase: SamplePhase) -> Vec<TouchDispatch<K>> {
    let Some((&target, ancestors)) = path.split_last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(path.len() * 2 - 1);
    let entry = |phase_of: Phase, node: K| Dispatch {
        phase: phase_of,
        node,
        meta: phase,
    };
    out.extend(ancestors.iter().map(|&n| entry(Phase::Capture, n)));
    out.push(entry(Phase::Target, target));
    out.extend(ancestors.iter().rev().map(|&n| entry(Phase::Bubble, n)));
    out
}

/// The handler property addressed by `dispatch`, e.g. `onTouchMoveCapture`.
pub fn handler_name<K>(dispatch: &TouchDispatch<K>) -> &'static str {
    let capture = dispatch.phase == Phase::Capture;
    match (dispatch.meta, capture) {
        (SamplePhase::Start, true) => "onTouchStartCapture",
        (SamplePhase::Start, false) => "onTouchStart",
        (SamplePhase::Move, true) => "onTouchMoveCapture",
        (SamplePhase::Move, false) => "onTouchMove",
        (SamplePhase::End, true) => "onTouchEndCapture",
        (SamplePhase::End, false) => "onTouchEnd",
        (SamplePhase::Cancel, true) => "onTouchCancelCapture",
        (SamplePhase::Cancel, false) => "onTouchCancel",
    }
}
