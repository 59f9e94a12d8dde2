// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Walk a dispatch sequence, stopping where a handler asks to.
//!
//! The handler's [`Outcome`] decides only whether propagation goes on. [`run`] hands back the
//! entry that stopped it, and any other state (a consumed flag, say) belongs on the event.
//!
//! Sequences normally come from [`touch::dispatch_sequence`](crate::touch::dispatch_sequence).
//!
//! ## Example
//!
//! ```
//! use tactile_responder::dispatcher;
//! use tactile_responder::touch::{dispatch_sequence, handler_name};
//! use tactile_responder::types::{Outcome, SamplePhase};
//!
//! // A scroll view (1) holding a button (2).
//! let seq = dispatch_sequence(&[1_u32, 2], SamplePhase::Start);
//! let mut called = Vec::new();
//! let stopped = dispatcher::run(&seq, &mut called, |d, called| {
//!     called.push(handler_name(d));
//!     if d.node == 2 { Outcome::Stop } else { Outcome::Continue }
//! });
//!
//! // The button consumed the touch, so the scroll view never sees the bubble.
//! assert_eq!(stopped.map(|d| d.node), Some(2));
//! assert_eq!(called, ["onTouchStartCapture", "onTouchStart"]);
//! ```

use crate::types::{Dispatch, Outcome};

/// Call `handler` for each entry of `seq` in order.
///
/// Returns the entry whose handler returned [`Outcome::Stop`], or `None` once every entry
/// has been visited.
pub fn run<'a, K, M, E>(
    seq: &'a [Dispatch<K, M>],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch<K, M>, &mut E) -> Outcome,
) -> Option<&'a Dispatch<K, M>> {
    seq.iter().find(|d| matches!(handler(d, event), Outcome::Stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::touch::{dispatch_sequence, handler_name};
    use crate::types::{Phase, SamplePhase};
    use alloc::vec::Vec;

    const PATH: [u32; 3] = [10, 20, 30];

    #[test]
    fn unstopped_walk_visits_every_handler() {
        let seq = dispatch_sequence(&PATH, SamplePhase::Move);
        let mut visited = 0_usize;
        let stopped = run(&seq, &mut visited, |_, visited| {
            *visited += 1;
            Outcome::Continue
        });
        assert!(stopped.is_none());
        assert_eq!(visited, 5);
    }

    #[test]
    fn stop_at_the_root_ends_the_walk() {
        let seq = dispatch_sequence(&PATH, SamplePhase::Start);
        let mut called: Vec<(u32, &str)> = Vec::new();
        let stopped = run(&seq, &mut called, |d, called| {
            called.push((d.node, handler_name(d)));
            if d.node == 10 {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        assert_eq!(stopped.map(|d| d.phase), Some(Phase::Capture));
        assert_eq!(called, [(10, "onTouchStartCapture")]);
    }

    #[test]
    fn bubble_stop_skips_outer_ancestors() {
        let seq = dispatch_sequence(&PATH, SamplePhase::End);
        let stopped = run(&seq, &mut (), |d, _| {
            if d.phase == Phase::Bubble {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        })
        .unwrap();
        assert_eq!((stopped.node, handler_name(stopped)), (20, "onTouchEnd"));
    }

    #[test]
    fn empty_sequence_never_calls_the_handler() {
        let stopped = run::<u32, (), _>(&[], &mut (), |_, _| unreachable!());
        assert!(stopped.is_none());
    }
}
