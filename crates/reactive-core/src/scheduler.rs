//! The batched, deterministic watcher scheduler. One queue per
//! thread, ascending-id FIFO ordering, a live-bound draining loop that
//! tolerates watchers re-queuing themselves mid-flush, and a
//! per-watcher re-entry counter that aborts a runaway flush instead of
//! looping forever.
//!
//! Grounded in `batch.rs`'s `BatchScope`/`flush()` deferred-queue shape
//! (accumulate while busy, drain once idle) and `effect_system.rs`'s
//! `tracing::debug_span!` instrumentation convention applied to the
//! flush span.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use web_time::Instant;

use crate::config;
use crate::error::ReactiveError;
use crate::host;
use crate::watcher::Watcher;

/// A watcher that re-queues itself more than this many times within a
/// single flush is assumed to be circularly dependent on itself; the
/// flush aborts rather than spinning forever.
pub const MAX_UPDATE_COUNT: u32 = 100;

struct SchedulerState {
    queue: Vec<Rc<Watcher>>,
    has: FxHashSet<u64>,
    waiting: bool,
    flushing: bool,
    index: usize,
    circular: FxHashMap<u64, u32>,
    current_flush_timestamp: Option<Instant>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            has: FxHashSet::default(),
            waiting: false,
            flushing: false,
            index: 0,
            circular: FxHashMap::default(),
            current_flush_timestamp: None,
        }
    }
}

thread_local! {
    static SCHEDULER: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

/// Enqueue `watcher` for the next flush. A watcher already pending is
/// skipped. If a flush is in progress, the watcher is inserted in
/// ascending-id order strictly after the position currently being
/// drained, so it still runs this flush instead of being starved
/// until the next one.
pub fn queue_watcher(watcher: Rc<Watcher>) {
    let id = watcher.id();
    let mut needs_schedule = false;

    SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        if s.has.contains(&id) {
            return;
        }
        s.has.insert(id);

        if !s.flushing {
            s.queue.push(watcher);
        } else {
            let index = s.index;
            let mut insert_at = s.queue.len();
            while insert_at > index + 1 && s.queue[insert_at - 1].id() > id {
                insert_at -= 1;
            }
            s.queue.insert(insert_at, watcher);
        }

        if !s.waiting {
            s.waiting = true;
            needs_schedule = true;
        }
    });

    if needs_schedule {
        if config::is_async() {
            host::host().schedule(Box::new(flush_scheduler_queue));
        } else {
            flush_scheduler_queue();
        }
    }
}

/// Drain the queue. Each watcher's `before` hook runs immediately
/// before it, its pending flag is cleared before it runs (so it can
/// re-queue itself), and re-entries are counted per watcher id against
/// [`MAX_UPDATE_COUNT`].
pub fn flush_scheduler_queue() {
    let initial_queue_len = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        s.current_flush_timestamp = Some(Instant::now());
        s.flushing = true;
        s.queue.sort_by_key(Watcher::id);
        s.queue.len() as u64
    });

    let start = Instant::now();
    let mut watchers_run: u64 = 0;
    let mut updated_owners: Vec<u64> = Vec::new();
    let mut aborted = false;

    let span = tracing::debug_span!(
        "reactive.flush",
        queue_len = tracing::field::Empty,
        watchers_run = tracing::field::Empty,
        duration_us = tracing::field::Empty,
    );
    let _entered = span.enter();

    loop {
        let next = SCHEDULER.with(|s| {
            let mut s = s.borrow_mut();
            if s.index < s.queue.len() {
                let watcher = Rc::clone(&s.queue[s.index]);
                s.index += 1;
                Some(watcher)
            } else {
                None
            }
        });
        let Some(watcher) = next else { break };
        let id = watcher.id();

        watcher.call_before();
        SCHEDULER.with(|s| {
            s.borrow_mut().has.remove(&id);
        });
        watcher.run();
        watchers_run += 1;
        if watcher.is_render_watcher() {
            let owner = watcher.owner();
            if !updated_owners.contains(&owner) {
                updated_owners.push(owner);
            }
        }

        let requeued = SCHEDULER.with(|s| s.borrow().has.contains(&id));
        if requeued {
            let count = SCHEDULER.with(|s| {
                let mut s = s.borrow_mut();
                let count = s.circular.entry(id).or_insert(0);
                *count += 1;
                *count
            });
            if count > MAX_UPDATE_COUNT {
                let err = ReactiveError::MaxUpdateCountExceeded { id };
                tracing::warn!(watcher_id = id, expression = watcher.expression(), "{err}");
                aborted = true;
                break;
            }
        }
    }

    span.record("queue_len", initial_queue_len);
    span.record("watchers_run", watchers_run);
    span.record("duration_us", start.elapsed().as_micros() as u64);
    drop(_entered);

    let activated_owners = SCHEDULER.with(|s| {
        let mut s = s.borrow_mut();
        s.queue.clear();
        s.has.clear();
        s.circular.clear();
        s.waiting = false;
        s.flushing = false;
        s.index = 0;
        s.current_flush_timestamp = None;
        ACTIVATED_QUEUE.with(|a| std::mem::take(&mut *a.borrow_mut()))
    });
    let _ = aborted;

    let h = host::host();
    for owner in updated_owners {
        h.updated(owner);
    }
    for owner in activated_owners {
        h.activated(owner);
    }
}

thread_local! {
    static ACTIVATED_QUEUE: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Register a component instance as "kept alive and reactivated" this
/// flush. Component lifecycle lives outside this crate; this is purely
/// the hand-off point a host's keep-alive machinery would call into so
/// [`host::LifecycleHooks::activated`] fires at the right time (after
/// the flush drains, on the pre-reset snapshot).
pub fn queue_activated(owner: u64) {
    ACTIVATED_QUEUE.with(|a| a.borrow_mut().push(owner));
}

/// Timestamp of the flush currently in progress, if any.
#[must_use]
pub fn current_flush_timestamp() -> Option<Instant> {
    SCHEDULER.with(|s| s.borrow().current_flush_timestamp)
}
