//! The scheduler flushes watchers in ascending-id order (construction
//! order, since ids are assigned monotonically); queueing the same
//! watcher twice before a flush runs it only once; two writes made
//! before the host's microtask callback fires coalesce into a single
//! flush; and a watcher that re-queues an already-processed, different
//! watcher mid-flush still gets it run again before the flush ends.

mod support;

use std::cell::RefCell;
use std::rc::Rc;

use reactive_core::config::{set_config, ReactiveConfig};
use reactive_core::host::{reset_host, set_host, Host};
use reactive_core::record::Record;
use reactive_core::scheduler::queue_watcher;
use reactive_core::value::Value;
use reactive_core::watcher::{Watcher, WatcherOptions};

use support::DeferredHost;

#[test]
fn watchers_flush_in_ascending_id_order() {
    set_config(ReactiveConfig { async_flush: false });

    let data = Record::new();
    data.define_reactive("x", Value::Number(0.0), false);

    let order = Rc::new(RefCell::new(Vec::<u32>::new()));

    let mut watchers = Vec::new();
    for label in 0..5u32 {
        let data_for_getter = data.clone();
        let order_for_cb = Rc::clone(&order);
        let watcher = Watcher::new(
            0,
            Box::new(move || data_for_getter.get("x").unwrap()),
            Box::new(move |_, _| order_for_cb.borrow_mut().push(label)),
            WatcherOptions::default(),
        );
        watchers.push(watcher);
    }

    data.set("x", Value::Number(1.0)).unwrap();

    assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
    set_config(ReactiveConfig::default());
}

#[test]
fn double_queue_before_flush_runs_the_getter_once() {
    let host = DeferredHost::new();
    set_host(Rc::clone(&host) as Rc<dyn Host>);
    set_config(ReactiveConfig { async_flush: true });

    let evaluations = Rc::new(RefCell::new(0u32));
    let evaluations_for_getter = Rc::clone(&evaluations);

    let runs = Rc::new(RefCell::new(0u32));
    let runs_for_cb = Rc::clone(&runs);

    let watcher = Watcher::new(
        0,
        Box::new(move || {
            *evaluations_for_getter.borrow_mut() += 1;
            Value::Number(1.0)
        }),
        Box::new(move |_, _| *runs_for_cb.borrow_mut() += 1),
        WatcherOptions::default(),
    );

    // Both calls land before the host ever runs its scheduled callback
    // — the `has` set must dedup them into a single queue entry.
    queue_watcher(Rc::clone(&watcher));
    queue_watcher(Rc::clone(&watcher));
    assert_eq!(host.pending_count(), 1);
    assert_eq!(*evaluations.borrow(), 1, "constructing the watcher evaluates it once");

    host.drain();
    assert_eq!(*evaluations.borrow(), 2, "exactly one flush re-evaluation, not two");
    assert_eq!(*runs.borrow(), 1);

    reset_host();
    set_config(ReactiveConfig::default());
}

#[test]
fn two_writes_before_the_host_runs_its_callback_batch_into_one_flush() {
    let host = DeferredHost::new();
    set_host(Rc::clone(&host) as Rc<dyn Host>);
    set_config(ReactiveConfig { async_flush: true });

    let data = Record::new();
    data.define_reactive("a", Value::Number(1.0), false);
    data.define_reactive("b", Value::Number(2.0), false);

    let trace = Rc::new(RefCell::new(Vec::<(f64, f64)>::new()));
    let trace_for_cb = Rc::clone(&trace);
    let data_for_getter = data.clone();

    let _watcher = Watcher::new(
        0,
        Box::new(move || {
            let a = match data_for_getter.get("a").unwrap() {
                Value::Number(n) => n,
                _ => unreachable!(),
            };
            let b = match data_for_getter.get("b").unwrap() {
                Value::Number(n) => n,
                _ => unreachable!(),
            };
            Value::Number(a + b)
        }),
        Box::new(move |new_value, old_value| {
            if let (Value::Number(new), Value::Number(old)) = (new_value, old_value) {
                trace_for_cb.borrow_mut().push((*new, *old));
            }
        }),
        WatcherOptions::default(),
    );

    data.set("b", Value::Number(20.0)).unwrap();
    data.set("a", Value::Number(30.0)).unwrap();
    assert_eq!(host.pending_count(), 1, "second write must not schedule a second flush");

    host.drain();

    assert_eq!(*trace.borrow(), vec![(50.0, 3.0)]);

    reset_host();
    set_config(ReactiveConfig::default());
}

#[test]
fn a_watcher_can_requeue_an_already_processed_different_watcher_mid_flush() {
    let host = DeferredHost::new();
    set_host(Rc::clone(&host) as Rc<dyn Host>);
    set_config(ReactiveConfig { async_flush: true });

    let data = Record::new();
    data.define_reactive("x", Value::Number(0.0), false);

    let run_order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    let watchers: Rc<RefCell<Vec<Rc<Watcher>>>> = Rc::new(RefCell::new(Vec::new()));

    for label in 0..5u32 {
        let data_for_getter = data.clone();
        let run_order_for_getter = Rc::clone(&run_order);
        let watchers_for_cb = Rc::clone(&watchers);

        let watcher = Watcher::new(
            0,
            Box::new(move || {
                // Recorded unconditionally so the trace reflects every
                // evaluation, not just the ones whose callback fires.
                run_order_for_getter.borrow_mut().push(label);
                data_for_getter.get("x").unwrap()
            }),
            Box::new(move |_, _| {
                if label == 4 {
                    let target = Rc::clone(&watchers_for_cb.borrow()[2]);
                    queue_watcher(target);
                }
            }),
            WatcherOptions::default(),
        );
        watchers.borrow_mut().push(watcher);
    }

    run_order.borrow_mut().clear();
    data.set("x", Value::Number(1.0)).unwrap();
    host.drain();

    assert_eq!(*run_order.borrow(), vec![0, 1, 2, 3, 4, 2]);

    reset_host();
    set_config(ReactiveConfig::default());
}
