// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracker configuration.

/// Policies that are not dictated by the hooks themselves.
///
/// ```
/// use tactile_responder::config::TrackerConfig;
///
/// let config = TrackerConfig::default()
///     .with_yield_without_termination_hook(true)
///     .with_sample_history(Some(32));
/// assert!(config.yield_without_termination_hook);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Whether a holder without `onResponderTerminationRequest` yields to a claimant.
    ///
    /// `false` (the default) keeps the slot with the holder, so a node must opt in to being
    /// interrupted.
    pub yield_without_termination_hook: bool,
    /// Maximum number of samples kept per gesture, or `None` to keep all of them.
    ///
    /// The oldest samples are dropped first. A bound of zero is treated as one, since the
    /// current sample is always visible to hooks.
    pub sample_history: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            yield_without_termination_hook: false,
            sample_history: None,
        }
    }
}

impl TrackerConfig {
    /// Set [`yield_without_termination_hook`](Self::yield_without_termination_hook).
    pub fn with_yield_without_termination_hook(mut self, yield_: bool) -> Self {
        self.yield_without_termination_hook = yield_;
        self
    }

    /// Set [`sample_history`](Self::sample_history).
    pub fn with_sample_history(mut self, limit: Option<usize>) -> Self {
        self.sample_history = limit;
        self
    }
}
