//! Benchmarks for the scheduler flush path: how queueing cost and
//! flush cost scale with fan-out (one `Dep` notifying many watchers)
//! and with chain depth (one watcher's callback dirtying the next).
//!
//! Run with: cargo bench -p reactive-core --bench scheduler_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

use reactive_core::config::{set_config, ReactiveConfig};
use reactive_core::dep::Dep;
use reactive_core::value::Value;
use reactive_core::watcher::{Watcher, WatcherOptions};

fn setup_fanout(n: usize) -> (Dep, Vec<Rc<Watcher>>) {
    let dep = Dep::new();
    let counter = Rc::new(RefCell::new(0.0f64));
    let watchers: Vec<Rc<Watcher>> = (0..n)
        .map(|_| {
            let dep_for_getter = dep.clone();
            let counter_for_getter = Rc::clone(&counter);
            Watcher::new(
                0,
                Box::new(move || {
                    dep_for_getter.depend();
                    Value::Number(*counter_for_getter.borrow())
                }),
                Box::new(|_, _| {}),
                WatcherOptions::default(),
            )
        })
        .collect();
    (dep, watchers)
}

fn bench_notify_fanout(c: &mut Criterion) {
    set_config(ReactiveConfig { async_flush: false });
    let mut group = c.benchmark_group("dep_notify_fanout");
    for n in [1usize, 10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let (dep, watchers) = setup_fanout(n);
            b.iter(|| {
                black_box(dep.notify());
            });
            black_box(watchers.len());
        });
    }
    group.finish();
}

fn bench_queue_and_flush_chain(c: &mut Criterion) {
    set_config(ReactiveConfig { async_flush: false });
    let mut group = c.benchmark_group("scheduler_chain");
    for depth in [1usize, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let counter = Rc::new(RefCell::new(0u32));
                for _ in 0..depth {
                    let counter_for_cb = Rc::clone(&counter);
                    let w = Watcher::new(
                        0,
                        Box::new(move || Value::Number(*counter_for_cb.borrow() as f64)),
                        Box::new(|_, _| {}),
                        WatcherOptions { sync: true, ..WatcherOptions::default() },
                    );
                    *counter.borrow_mut() += 1;
                    w.update();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_notify_fanout, bench_queue_and_flush_chain);
criterion_main!(benches);
