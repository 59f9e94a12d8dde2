// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for the responder tracker.
//!
//! Random hook configurations and random sample streams from several devices are fed
//! through a fixed scene. After every step:
//!
//! 1. Each device has at most one responder, and only while it has a live gesture
//! 2. Move, end, and release go only to the device's current holder
//! 3. Terminate goes only to the node that held the slot before the step, at most once
//! 4. A node receives moves only after a grant in the same gesture
//! 5. Malformed samples change nothing
//! 6. A root that captures every start always wins, unless it declines

use std::collections::BTreeMap;

use kurbo::{Point, Rect};
use proptest::prelude::*;
use tactile_responder::config::TrackerConfig;
use tactile_responder::error::{HookError, TrackerError};
use tactile_responder::hooks::{
    Capabilities, ClaimHook, Grant, HookKind, Notification, ResponderHooks,
};
use tactile_responder::tracker::{SampleReport, Tracker};
use tactile_responder::types::{DeviceId, PointerSample, ResponderEvent, SamplePhase};
use tactile_view_tree::{LocalNode, NodeId, Tree};

// ── Scene ───────────────────────────────────────────────────────────────

/// Root 0..300 containing B 0..200 containing C 0..100, and a sibling D 200..300 under root.
fn scene() -> (Tree, [NodeId; 4]) {
    let mut tree = Tree::new();
    let node = |x0, x1| LocalNode {
        local_bounds: Rect::new(x0, 0.0, x1, 300.0),
        ..LocalNode::default()
    };
    let a = tree.insert(None, node(0.0, 300.0));
    let b = tree.insert(Some(a), node(0.0, 200.0));
    let c = tree.insert(Some(b), node(0.0, 100.0));
    let d = tree.insert(Some(a), node(200.0, 300.0));
    let _ = tree.commit();
    (tree, [a, b, c, d])
}

// ── Hooks ───────────────────────────────────────────────────────────────

/// Per-node answers, indexed like the scene's node array.
#[derive(Debug, Clone)]
struct NodeScript {
    claims: [bool; 4],
    yields: Option<bool>,
    grant: Grant,
}

struct Scripted {
    nodes: [NodeId; 4],
    scripts: Vec<NodeScript>,
}

impl Scripted {
    fn script(&self, node: &NodeId) -> Option<&NodeScript> {
        self.nodes
            .iter()
            .position(|n| n == node)
            .map(|i| &self.scripts[i])
    }
}

fn claim_index(hook: ClaimHook) -> usize {
    match hook {
        ClaimHook::StartCapture => 0,
        ClaimHook::Start => 1,
        ClaimHook::MoveCapture => 2,
        ClaimHook::Move => 3,
    }
}

impl ResponderHooks<NodeId> for Scripted {
    fn capabilities(&self, node: &NodeId) -> Capabilities {
        let Some(script) = self.script(node) else {
            return Capabilities::empty();
        };
        let mut caps = Capabilities::GRANT;
        if script.yields.is_some() {
            caps |= Capabilities::TERMINATION_REQUEST;
        }
        for hook in [
            ClaimHook::StartCapture,
            ClaimHook::Start,
            ClaimHook::MoveCapture,
            ClaimHook::Move,
        ] {
            caps |= hook.kind().capability();
        }
        caps
    }

    fn should_set_responder(
        &mut self,
        node: &NodeId,
        hook: ClaimHook,
        _: &ResponderEvent<'_, NodeId>,
    ) -> Result<bool, HookError> {
        Ok(self
            .script(node)
            .is_some_and(|s| s.claims[claim_index(hook)]))
    }

    fn grant(&mut self, node: &NodeId, _: &ResponderEvent<'_, NodeId>) -> Result<Grant, HookError> {
        Ok(self.script(node).map_or(Grant::Accept, |s| s.grant))
    }

    fn termination_request(
        &mut self,
        node: &NodeId,
        _: &ResponderEvent<'_, NodeId>,
    ) -> Result<bool, HookError> {
        Ok(self.script(node).and_then(|s| s.yields).unwrap_or(false))
    }

    fn notify(
        &mut self,
        _: &NodeId,
        _: Notification,
        _: &ResponderEvent<'_, NodeId>,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Sample {
        device: u32,
        phase: SamplePhase,
        x: f64,
        dt: i8,
    },
    Takeover {
        device: u32,
        new_owner: Option<usize>,
    },
    CancelAll,
}

fn phase_strategy() -> impl Strategy<Value = SamplePhase> {
    prop_oneof![
        2 => Just(SamplePhase::Start),
        5 => Just(SamplePhase::Move),
        2 => Just(SamplePhase::End),
        1 => Just(SamplePhase::Cancel),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        12 => (0u32..3, phase_strategy(), 0.0f64..400.0, -2i8..20)
            .prop_map(|(device, phase, x, dt)| Op::Sample { device, phase, x, dt }),
        2 => (0u32..3, proptest::option::of(0usize..4))
            .prop_map(|(device, new_owner)| Op::Takeover { device, new_owner }),
        1 => Just(Op::CancelAll),
    ]
}

fn script_strategy() -> impl Strategy<Value = NodeScript> {
    (
        any::<[bool; 4]>(),
        proptest::option::of(any::<bool>()),
        prop_oneof![4 => Just(Grant::Accept), 1 => Just(Grant::Decline)],
    )
        .prop_map(|(claims, yields, grant)| NodeScript {
            claims,
            yields,
            grant,
        })
}

// ── Model checks ────────────────────────────────────────────────────────

/// Per-device facts carried between steps.
#[derive(Default, Debug)]
struct DeviceModel {
    holder: Option<NodeId>,
    granted: Vec<NodeId>,
}

fn check_report(
    model: &mut DeviceModel,
    report: &SampleReport<NodeId>,
) -> Result<(), TestCaseError> {
    let before = model.holder;
    let mut terminates = 0;
    for d in &report.deliveries {
        match d.hook {
            HookKind::ResponderGrant => {
                // Only a forced takeover may re-offer the slot to the node it just terminated.
                prop_assert!(
                    Some(d.node) != before || terminates == 1,
                    "holder was offered its own slot"
                );
                model.granted.push(d.node);
            }
            HookKind::ResponderMove => {
                prop_assert_eq!(Some(d.node), report.responder, "move to a non-holder");
                prop_assert!(model.granted.contains(&d.node), "move before grant");
            }
            HookKind::ResponderEnd | HookKind::ResponderRelease => {
                prop_assert_eq!(Some(d.node), before, "end/release to a non-holder");
            }
            HookKind::ResponderTerminate => {
                terminates += 1;
                prop_assert_eq!(Some(d.node), before, "terminate to a non-holder");
            }
            HookKind::ResponderStart => {
                prop_assert_eq!(Some(d.node), report.responder, "start to a non-holder");
            }
            _ => {}
        }
    }
    prop_assert!(terminates <= 1, "terminated {} times in one step", terminates);
    model.holder = report.responder;
    Ok(())
}

fn run_ops(
    scripts: Vec<NodeScript>,
    ops: &[Op],
    config: TrackerConfig,
) -> Result<(), TestCaseError> {
    let (tree, nodes) = scene();
    let mut hooks = Scripted { nodes, scripts };
    let mut tracker: Tracker<NodeId> = Tracker::new(config);
    let mut models: BTreeMap<DeviceId, DeviceModel> = BTreeMap::new();
    let mut clocks: BTreeMap<DeviceId, u64> = BTreeMap::new();

    for op in ops {
        let results: Vec<(DeviceId, Result<SampleReport<NodeId>, TrackerError<NodeId>>)> =
            match *op {
                Op::Sample { device, phase, x, dt } => {
                    let device = DeviceId::touch(device);
                    let clock = clocks.entry(device).or_insert(100);
                    *clock = clock.saturating_add_signed(i64::from(dt));
                    let sample = PointerSample::new(device, phase, Point::new(x, 10.0), *clock);
                    vec![(device, tracker.on_sample(&tree, &mut hooks, sample))]
                }
                Op::Takeover { device, new_owner } => {
                    let device = DeviceId::touch(device);
                    let new_owner = new_owner.map(|i| nodes[i]);
                    vec![(device, tracker.force_takeover(device, &mut hooks, new_owner))]
                }
                Op::CancelAll => {
                    let devices: Vec<DeviceId> = tracker.live_devices().collect();
                    devices
                        .into_iter()
                        .zip(tracker.cancel_all(&mut hooks))
                        .collect()
                }
            };

        for (device, result) in results {
            match result {
                Ok(report) => {
                    let model = models.entry(device).or_default();
                    check_report(model, &report)?;
                    if tracker.gesture(device).is_none() {
                        models.remove(&device);
                    }
                }
                Err(TrackerError::HookFailed { .. }) => {
                    prop_assert!(false, "scripted hooks never fail");
                }
                Err(TrackerError::Malformed { .. }) => {
                    // Nothing changed for this device.
                    prop_assert_eq!(
                        tracker.responder(device),
                        models.get(&device).and_then(|m| m.holder)
                    );
                }
            }
        }

        for device in tracker.live_devices() {
            let expected = models.get(&device).and_then(|m| m.holder);
            prop_assert_eq!(tracker.responder(device), expected);
        }
        for device in models.keys() {
            prop_assert!(
                tracker.gesture(*device).is_some(),
                "model keeps a device the tracker dropped"
            );
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1–5. Exclusive ownership and notification routing
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn notifications_follow_the_slot(
        scripts in proptest::collection::vec(script_strategy(), 4),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        run_ops(scripts, &ops, TrackerConfig::default())?;
    }

    #[test]
    fn notifications_follow_the_slot_with_lenient_yield(
        scripts in proptest::collection::vec(script_strategy(), 4),
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        run_ops(
            scripts,
            &ops,
            TrackerConfig::default()
                .with_yield_without_termination_hook(true)
                .with_sample_history(Some(4)),
        )?;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Root capture wins
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn root_capture_always_wins_the_start(
        scripts in proptest::collection::vec(script_strategy(), 4),
        x in 0.0f64..300.0,
    ) {
        let mut scripts = scripts;
        scripts[0].claims[claim_index(ClaimHook::StartCapture)] = true;
        scripts[0].grant = Grant::Accept;
        let (tree, nodes) = scene();
        let mut hooks = Scripted { nodes, scripts };
        let mut tracker: Tracker<NodeId> = Tracker::default();
        let device = DeviceId::touch(0);
        let report = tracker
            .on_sample(
                &tree,
                &mut hooks,
                PointerSample::new(device, SamplePhase::Start, Point::new(x, 10.0), 0),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(report.responder, Some(nodes[0]));
    }
}
