//! Shared test-only host: unlike [`reactive_core::host::SyncHost`], it
//! actually defers `NextTick::schedule` callbacks instead of running
//! them inline, so a test can prove two writes coalesce into a single
//! flush rather than relying on the value-equality short-circuit to
//! paper over a micro-flush-per-write reality.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use reactive_core::host::{ErrorReporter, LifecycleHooks, NextTick};

#[derive(Default)]
pub struct DeferredHost {
    pending: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl DeferredHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Run every callback accumulated since the last drain, in order,
    /// draining before running so a callback that schedules another
    /// one (as a flush that gets re-queued mid-drain would) is picked
    /// up by a later `drain()` call rather than looping here.
    pub fn drain(&self) {
        let callbacks: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl NextTick for DeferredHost {
    fn schedule(&self, callback: Box<dyn FnOnce()>) {
        self.pending.borrow_mut().push(callback);
    }
}

impl ErrorReporter for DeferredHost {
    fn report(&self, _message: &str, _context: &str) {}
}

impl LifecycleHooks for DeferredHost {
    fn updated(&self, _owner: u64) {}
    fn activated(&self, _owner: u64) {}
}
