// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to integrate with other Tactile crates.
//!
//! Each adapter is gated behind a feature flag so the core negotiator stays independent of
//! any particular tree.
//!
//! ## Available Adapters
//!
//! - [`view_tree`] (`view_tree_adapter` feature): lets a [`tactile_view_tree::Tree`] serve as
//!   the hit tester and parent lookup of a [`Tracker`](crate::tracker::Tracker).

#[cfg(feature = "view_tree_adapter")]
pub mod view_tree;
