//! `Dep`: a subscription channel — one per reactive property, one per
//! observable container (its "structural" dep).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config;
use crate::target_stack;
use crate::watcher::Watcher;

thread_local! {
    static NEXT_DEP_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_id() -> u64 {
    NEXT_DEP_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        id
    })
}

struct DepInner {
    id: u64,
    /// Ordered, duplicate-free. Strong handles: a dep keeps its
    /// subscribers reachable, matching the source's GC-reachability
    /// model — `Watcher::teardown` is what releases them (see
    /// `dep.rs`'s invariant tests and `watcher::Watcher::teardown`).
    subs: RefCell<Vec<Rc<Watcher>>>,
}

/// A subscription channel.
///
/// Cloning a `Dep` clones the handle, not the channel — both clones
/// observe and mutate the same subscriber list (`Rc` sharing), exactly
/// like `ftui-runtime`'s `Observable<T>` clone semantics.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: next_id(),
                subs: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Add `w` to the subscriber set if it is not already present.
    pub fn add_sub(&self, w: &Rc<Watcher>) {
        let mut subs = self.inner.subs.borrow_mut();
        if !subs.iter().any(|s| Rc::ptr_eq(s, w)) {
            subs.push(Rc::clone(w));
        }
    }

    /// Remove `w` from the subscriber set.
    pub fn remove_sub(&self, w: &Rc<Watcher>) {
        self.inner
            .subs
            .borrow_mut()
            .retain(|s| !Rc::ptr_eq(s, w));
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    #[must_use]
    #[cfg(test)]
    pub(crate) fn has_sub(&self, w: &Rc<Watcher>) -> bool {
        self.inner.subs.borrow().iter().any(|s| Rc::ptr_eq(s, w))
    }

    /// If a watcher is currently evaluating (top of the target stack),
    /// record a mutual dependency by routing through
    /// [`Watcher::add_dep`] — the watcher is the one that decides
    /// whether this is a fresh dependency this evaluation.
    pub fn depend(&self) {
        if let Some(current) = target_stack::current() {
            current.add_dep(self.clone());
        }
    }

    /// Snapshot subscribers, optionally sort by id (synchronous-mode
    /// ordering guarantee), then call `update()` on each.
    ///
    /// Snapshotting first matters because a subscriber's own
    /// re-evaluation (triggered by `update` in synchronous mode) can
    /// add or remove subscribers from this very dep as a side effect —
    /// mutating `subs` while iterating it would be a logic bug (or,
    /// with a `RefCell`, a borrow panic).
    pub fn notify(&self) {
        let mut subs: Vec<Rc<Watcher>> = self.inner.subs.borrow().clone();
        if !config::is_async() {
            subs.sort_by_key(|w| w.id());
        }
        tracing::trace!(dep_id = self.inner.id, subscriber_count = subs.len(), "dep notify");
        for w in subs {
            w.update();
        }
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}
