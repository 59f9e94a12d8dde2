// Copyright 2025 the Tactile Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A button inside a vertical scroll view.
//!
//! Pressing the button makes it the responder. Once the finger travels far enough
//! vertically, the scroll view claims the gesture from its capture hook, the button agrees
//! to let go, and the scroll view receives the rest of the moves.
//!
//! Run:
//! - `cargo run -p tactile_demos --example nested_scroll`
//! - `RUST_LOG=tactile_responder=trace cargo run -p tactile_demos --example nested_scroll`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Insets, Point, Rect};
use tactile_responder::hooks::{Grant, HookSet, NodeHooks};
use tactile_responder::touch::{dispatch_sequence, handler_name};
use tactile_responder::tracker::Tracker;
use tactile_responder::types::{DeviceId, PointerSample, SamplePhase};
use tactile_view_tree::{LocalNode, NodeId, Tree};
use tracing_subscriber::EnvFilter;

const SCROLL_SLOP: f64 = 10.0;

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, line: impl Into<String>) {
    log.borrow_mut().push(line.into());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tactile_responder=debug")),
        )
        .init();

    let mut tree = Tree::new();
    let scroll: NodeId = tree.insert(
        None,
        LocalNode {
            local_bounds: Rect::new(0.0, 0.0, 320.0, 480.0),
            ..Default::default()
        },
    );
    let button: NodeId = tree.insert(
        Some(scroll),
        LocalNode {
            local_bounds: Rect::new(100.0, 200.0, 220.0, 240.0),
            hit_slop: Some(Insets::uniform(8.0)),
            ..Default::default()
        },
    );
    let _ = tree.commit();

    let log: Log = Rc::default();
    let mut hooks = HookSet::new();

    let (l1, l2, l3, l4) = (log.clone(), log.clone(), log.clone(), log.clone());
    hooks.register(
        button,
        NodeHooks::new()
            .on_start_should_set_responder(|_| Ok(true))
            .on_responder_grant(move |_| {
                record(&l1, "button: grant (highlight)");
                Ok(Grant::Accept)
            })
            .on_responder_termination_request(|_| Ok(true))
            .on_responder_terminate(move |_| {
                record(&l2, "button: terminate (unhighlight, no press)");
                Ok(())
            })
            .on_responder_release(move |_| {
                record(&l3, "button: release (press!)");
                Ok(())
            })
            .on_responder_move(move |ev| {
                record(&l4, format!("button: move to {:?}", ev.sample.point));
                Ok(())
            }),
    );

    let (s1, s2, s3) = (log.clone(), log.clone(), log.clone());
    hooks.register(
        scroll,
        NodeHooks::new()
            .on_move_should_set_responder_capture(|ev| {
                let Some(first) = ev.history.first() else {
                    return Ok(false);
                };
                Ok((ev.sample.point.y - first.point.y).abs() > SCROLL_SLOP)
            })
            .on_responder_grant(move |_| {
                record(&s1, "scroll: grant (start scrolling)");
                Ok(Grant::Accept)
            })
            .on_responder_move(move |ev| {
                let dy = ev.history.first().map_or(0.0, |f| ev.sample.point.y - f.point.y);
                record(&s2, format!("scroll: offset {dy:.0}"));
                Ok(())
            })
            .on_responder_release(move |_| {
                record(&s3, "scroll: release (fling)");
                Ok(())
            }),
    );

    let mut tracker = Tracker::default();
    let finger = DeviceId::touch(0);
    let path = [
        (SamplePhase::Start, 160.0, 220.0),
        (SamplePhase::Move, 161.0, 223.0),
        (SamplePhase::Move, 162.0, 240.0),
        (SamplePhase::Move, 162.0, 300.0),
        (SamplePhase::End, 162.0, 310.0),
    ];
    for (t, (phase, x, y)) in path.into_iter().enumerate() {
        let sample = PointerSample::new(finger, phase, Point::new(x, y), t as u64 * 16);
        match tracker.on_sample(&tree, &mut hooks, sample) {
            Ok(report) => {
                if phase == SamplePhase::Start {
                    for d in dispatch_sequence(&report.origin, phase) {
                        println!("  {} on {:?}", handler_name(&d), d.node);
                    }
                }
                println!(
                    "{phase:?} at ({x}, {y}) -> responder {:?}",
                    report.responder
                );
            }
            Err(err) => println!("{phase:?} at ({x}, {y}) -> error: {err}"),
        }
        for line in log.borrow_mut().drain(..) {
            println!("  {line}");
        }
    }
}
