// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tactile Responder: gesture-responder negotiation over a view tree.
//!
//! ## Overview
//!
//! During a touch or pointer gesture, exactly one view at a time is the *responder*: the
//! exclusive recipient of the gesture's samples. This crate decides who that is and keeps
//! the decision consistent as the gesture evolves.
//!
//! - The [`Tracker`](tracker::Tracker) consumes platform samples per device, hit tests each
//!   one through a [`HitTest`](types::HitTest) view, and keeps one live
//!   [`Gesture`](gesture::Gesture) and one [`ResponderSlot`](slot::ResponderSlot) per device.
//! - The [`Negotiator`](negotiator::Negotiator) runs the claim protocol on start and move
//!   samples: capture predicates root → target, then bubble predicates target → root, then a
//!   termination request to any current holder.
//! - Application callbacks are supplied through [`ResponderHooks`](hooks::ResponderHooks),
//!   usually a [`HookSet`](hooks::HookSet) of per-node closures.
//!
//! ## Lifecycle
//!
//! A node that wins a claim receives `onResponderGrant` (and may decline). While it holds the
//! slot it receives `onResponderMove` for each move sample, then `onResponderEnd` and
//! `onResponderRelease` when the gesture ends. A holder that yields to another claimant, or
//! loses its gesture to a cancel or a forced takeover, receives `onResponderTerminate`
//! exactly once.
//!
//! ## Raw touch events
//!
//! Independently of negotiation, [`touch::dispatch_sequence`] builds the capture → target →
//! bubble order of `onTouchStart`/`Move`/`End`/`Cancel` handlers along a gesture's origin
//! path, and [`dispatcher::run`] walks it, honoring [`Outcome::Stop`](types::Outcome::Stop).
//!
//! ## Adapters
//!
//! - **View Tree Adapter** (`view_tree_adapter` feature, default): implements
//!   [`HitTest`](types::HitTest) and [`ParentLookup`](types::ParentLookup) for
//!   `tactile_view_tree::Tree`.
//!
//! ## Features
//!
//! - `std` (default): enables [`shared::SharedTracker`] for multi-threaded input sources.
//!
//! Without `std` this crate is `no_std` and uses `alloc`.
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]: each sample at `trace`, grants, transfers,
//! releases, and terminations at `debug`, and dropped samples and failing hooks at `warn`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gesture;
pub mod hooks;
pub mod negotiator;
#[cfg(feature = "std")]
pub mod shared;
pub mod slot;
pub mod touch;
pub mod tracker;
pub mod types;
