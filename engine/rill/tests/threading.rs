#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test code — panics provide clear failure messages"
)]

//! Sharing contract: one compiled channel graph, many evaluating
//! threads. Per-invocation state must never bleed between threads or
//! survive a panic on its own thread.

use std::sync::Arc;
use std::thread;

use rill::{
    BindingsReflector, Channel, ContentKind, Engine, FocusRef, LinkedFocus, ScopedSlot, Site,
    Value,
};

/// A channel whose value is whatever the calling thread pushed last —
/// the shape host adapters use for request-scoped inputs.
struct SlotSite {
    slot: Arc<ScopedSlot<Value>>,
}

impl Site for SlotSite {
    fn get(&self) -> Option<Value> {
        self.slot.current()
    }
}

fn thread_input(engine: &Engine) -> (Arc<ScopedSlot<Value>>, FocusRef) {
    let slot = Arc::new(ScopedSlot::new());
    let input = Channel::new(
        engine.registry().builtin(ContentKind::Int),
        Box::new(SlotSite {
            slot: Arc::clone(&slot),
        }),
    );
    let focus = LinkedFocus::scope(
        None,
        None,
        Some(BindingsReflector::new().with("input", input).anchor()),
        None,
        None,
    );
    (slot, focus)
}

#[test]
fn concurrent_record_instantiation_does_not_bleed_between_threads() {
    let engine = Engine::default();
    let (slot, focus) = thread_input(&engine);

    let expr = engine
        .parse("{n = input, next = n + 1, twice = input * 2}")
        .unwrap();
    let record_channel = engine.bind(&expr, &focus).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let channel = record_channel.clone();
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..250 {
                    let v = t * 10_000 + i;
                    let _guard = slot.push(Value::Int(v));
                    let instance = channel.get().expect("record");
                    let heap = instance.as_record().unwrap();
                    assert_eq!(heap.get(0), Some(Value::Int(v)), "n bled between threads");
                    assert_eq!(
                        heap.get(1),
                        Some(Value::Int(v + 1)),
                        "sibling reference read a foreign instance"
                    );
                    assert_eq!(heap.get(2), Some(Value::Int(v * 2)));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }
}

#[test]
fn nested_instantiation_restores_the_outer_instance() {
    let engine = Engine::default();
    let (slot, focus) = thread_input(&engine);

    // The inner record literal instantiates in the middle of the outer
    // record's construction; the outer current-instance must be intact
    // again for the `after` field.
    let expr = engine
        .parse("{a = input, inner = {x = input + 100}.x, after = a + inner}")
        .unwrap();
    let channel = engine.bind(&expr, &focus).unwrap();

    let _guard = slot.push(Value::Int(7));
    let instance = channel.get().expect("record");
    let heap = instance.as_record().unwrap();
    assert_eq!(heap.get(0), Some(Value::Int(7)));
    assert_eq!(heap.get(1), Some(Value::Int(107)));
    assert_eq!(heap.get(2), Some(Value::Int(114)));
}

#[test]
fn projections_keep_their_cursors_thread_local() {
    let engine = Engine::default();
    let focus = LinkedFocus::root();
    let expr = engine.parse("1..200 # [item] * 3").unwrap();
    let channel = engine.bind(&expr, &focus).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let channel = channel.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    let Some(Value::List(items)) = channel.get() else {
                        panic!("projection produced no list");
                    };
                    assert_eq!(items.len(), 200);
                    for (i, item) in items.iter().enumerate() {
                        assert_eq!(item, &Value::Int((i as i32 + 1) * 3));
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }
}

#[test]
fn a_panicking_evaluation_leaves_no_stale_thread_state() {
    let engine = Engine::default();
    let (slot, focus) = thread_input(&engine);

    // Integer division by zero is deliberately fail-fast; the record's
    // scoped instance must be popped by the unwinding guard.
    let expr = engine.parse("{q = input / (input - input)}").unwrap();
    let channel = engine.bind(&expr, &focus).unwrap();

    let _guard = slot.push(Value::Int(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| channel.get()));
    assert!(result.is_err(), "division by zero should propagate");

    // A later evaluation on this thread starts from a clean slate.
    let expr = engine.parse("{ok = input + 1}.ok").unwrap();
    let ok = engine.bind(&expr, &focus).unwrap();
    assert_eq!(ok.get(), Some(Value::Int(2)));
}
