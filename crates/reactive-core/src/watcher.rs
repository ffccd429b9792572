//! `Watcher`: a reactive computation. Every dependency-tracking
//! mechanism in this crate — a render, a computed property, a `watch`
//! callback — is an instance of this one type, distinguished only by
//! its mode flags: renders, computed properties, and user watchers all
//! share the same machinery.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::dep::Dep;
use crate::deep;
use crate::host;
use crate::scheduler;
use crate::target_stack;
use crate::value::Value;

thread_local! {
    static NEXT_WATCHER_ID: RefCell<u64> = const { RefCell::new(0) };
}

fn next_id() -> u64 {
    NEXT_WATCHER_ID.with(|c| {
        let mut c = c.borrow_mut();
        let id = *c;
        *c += 1;
        id
    })
}

/// Construction-time mode flags; `owner`/`is_render_watcher`/
/// `expression` are the additions needed to drive `LifecycleHooks`
/// and diagnostics.
pub struct WatcherOptions {
    /// Computed-property style: not evaluated until [`Watcher::evaluate`]
    /// is called; `update()` only flips `dirty`, it never re-runs
    /// eagerly or enqueues itself.
    pub lazy: bool,
    /// `update()` runs synchronously instead of going through the
    /// scheduler.
    pub sync: bool,
    /// After `getter()` returns, recursively walk the result so that
    /// every nested reactive property is also subscribed to.
    pub deep: bool,
    /// Getter/callback panics are caught and routed to
    /// [`host::ErrorReporter`] instead of propagating.
    pub user: bool,
    /// Invoked immediately before `run()` re-evaluates — used for
    /// e.g. a `beforeUpdate` lifecycle callback on the owning
    /// component.
    pub before: Option<Box<dyn Fn()>>,
    /// Opaque id of the owning component instance, for
    /// `LifecycleHooks` delivery. `0` when there is no owner.
    pub owner: u64,
    /// Tags this watcher as one whose completion should trigger
    /// `LifecycleHooks::updated` for its owner after a flush.
    pub is_render_watcher: bool,
    /// Diagnostic label — typically the original watch expression —
    /// surfaced in warnings and the infinite-loop error.
    pub expression: Option<String>,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            lazy: false,
            sync: false,
            deep: false,
            user: false,
            before: None,
            owner: 0,
            is_render_watcher: false,
            expression: None,
        }
    }
}

struct WatcherState {
    deps: Vec<Dep>,
    dep_ids: FxHashSet<u64>,
    new_deps: Vec<Dep>,
    new_dep_ids: FxHashSet<u64>,
    active: bool,
    dirty: bool,
    value: Value,
}

pub struct Watcher {
    id: u64,
    owner: u64,
    lazy: bool,
    sync: bool,
    deep: bool,
    user: bool,
    is_render_watcher: bool,
    expression: Option<String>,
    before: Option<Box<dyn Fn()>>,
    getter: Box<dyn Fn() -> Value>,
    cb: RefCell<Box<dyn FnMut(&Value, &Value)>>,
    state: RefCell<WatcherState>,
}

impl Watcher {
    /// Construct a watcher and, unless `lazy`, evaluate it once
    /// immediately to establish its baseline value and initial
    /// dependency set.
    #[must_use]
    pub fn new(
        owner: u64,
        getter: Box<dyn Fn() -> Value>,
        cb: Box<dyn FnMut(&Value, &Value)>,
        options: WatcherOptions,
    ) -> Rc<Self> {
        let lazy = options.lazy;
        let watcher = Rc::new(Self {
            id: next_id(),
            owner,
            lazy,
            sync: options.sync,
            deep: options.deep,
            user: options.user,
            is_render_watcher: options.is_render_watcher,
            expression: options.expression,
            before: options.before,
            getter,
            cb: RefCell::new(cb),
            state: RefCell::new(WatcherState {
                deps: Vec::new(),
                dep_ids: FxHashSet::default(),
                new_deps: Vec::new(),
                new_dep_ids: FxHashSet::default(),
                active: true,
                dirty: lazy,
                value: Value::Null,
            }),
        });
        if !lazy {
            let value = watcher.get();
            watcher.state.borrow_mut().value = value;
        }
        watcher
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> u64 {
        self.owner
    }

    #[must_use]
    pub fn is_render_watcher(&self) -> bool {
        self.is_render_watcher
    }

    #[must_use]
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.borrow().dirty
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    /// The value from the last evaluation — for a lazy watcher, the
    /// last `evaluate()` result, which may be stale if `is_dirty()`.
    /// Lets one watcher's getter read another's cached value directly,
    /// the way a computed property is read from a render function.
    #[must_use]
    pub fn value(&self) -> Value {
        self.state.borrow().value.clone()
    }

    /// Run the getter with this watcher as the active target,
    /// deep-traversing the result first if `deep` is set, then
    /// reconcile the dependency set collected this pass against the
    /// one from last time.
    pub fn get(self: &Rc<Self>) -> Value {
        target_stack::push_target(Some(Rc::clone(self)));
        let result = if self.user {
            match catch_unwind(AssertUnwindSafe(|| (self.getter)())) {
                Ok(value) => Some(value),
                Err(payload) => {
                    let message = panic_message(&payload);
                    host::host().report(
                        &message,
                        self.expression.as_deref().unwrap_or("<getter>"),
                    );
                    None
                }
            }
        } else {
            Some((self.getter)())
        };
        target_stack::pop_target();

        let value = result.unwrap_or(Value::Null);
        if self.deep {
            deep::traverse_root(&value);
        }
        self.cleanup_deps();
        value
    }

    /// Record that `dep` was read during the evaluation currently in
    /// progress. Subscribes to `dep` only the first time it's seen
    /// this pass, and only calls `dep.add_sub` if it wasn't already a
    /// subscriber from the previous pass — the classic two-set
    /// reconciliation that avoids redundant `add_sub`/`remove_sub`
    /// churn on every re-evaluation.
    pub fn add_dep(self: &Rc<Self>, dep: Dep) {
        let id = dep.id();
        let already_new = {
            let state = self.state.borrow();
            state.new_dep_ids.contains(&id)
        };
        if already_new {
            return;
        }
        let already_old = {
            let mut state = self.state.borrow_mut();
            state.new_dep_ids.insert(id);
            let already_old = state.dep_ids.contains(&id);
            state.new_deps.push(dep.clone());
            already_old
        };
        if !already_old {
            dep.add_sub(self);
        }
    }

    /// Swap the new dependency set into place, unsubscribing from any
    /// dep that was read last pass but not this one.
    fn cleanup_deps(self: &Rc<Self>) {
        let stale: Vec<Dep> = {
            let state = self.state.borrow();
            state
                .deps
                .iter()
                .filter(|d| !state.new_dep_ids.contains(&d.id()))
                .cloned()
                .collect()
        };
        for dep in &stale {
            dep.remove_sub(self);
        }
        let mut state = self.state.borrow_mut();
        state.deps.clear();
        state.deps.append(&mut state.new_deps);
        state.dep_ids.clear();
        state.dep_ids.extend(state.new_dep_ids.drain());
    }

    /// Called by a dep this watcher subscribes to, once per
    /// notification. Lazy watchers just go stale; synchronous
    /// watchers re-run immediately; everything else is queued for the
    /// next flush.
    pub fn update(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        if self.lazy {
            state.dirty = true;
        } else if self.sync {
            drop(state);
            self.run();
        } else {
            drop(state);
            scheduler::queue_watcher(Rc::clone(self));
        }
    }

    /// Re-evaluate and, if the result actually changed (or this is a
    /// `deep` watcher, where "changed" can't be decided by the root
    /// value alone), invoke the callback with the new and old values.
    ///
    /// A no-op if this watcher was torn down after being enqueued —
    /// `teardown` removes it from every dep's subscriber set but a
    /// flush already holding a clone in its queue still calls `run`.
    pub fn run(self: &Rc<Self>) {
        if !self.is_active() {
            return;
        }
        let new_value = self.get();
        let changed = {
            let state = self.state.borrow();
            new_value != state.value || new_value.is_container() || self.deep
        };
        if !changed {
            return;
        }
        let old_value = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.value, new_value.clone())
        };
        self.invoke_cb(&new_value, &old_value);
    }

    /// For lazy (computed) watchers: evaluate now and clear `dirty`.
    pub fn evaluate(self: &Rc<Self>) {
        let value = self.get();
        let mut state = self.state.borrow_mut();
        state.value = value;
        state.dirty = false;
    }

    /// Let whichever watcher is currently evaluating also depend on
    /// every dep this watcher collected — how a computed property's
    /// dependencies are re-exposed to the watcher that reads it.
    pub fn depend(&self) {
        for dep in &self.state.borrow().deps {
            dep.depend();
        }
    }

    /// Unsubscribe from every remaining dep. Idempotent.
    pub fn teardown(self: &Rc<Self>) {
        let active = self.state.borrow().active;
        if !active {
            return;
        }
        let deps = self.state.borrow().deps.clone();
        for dep in &deps {
            dep.remove_sub(self);
        }
        self.state.borrow_mut().active = false;
    }

    pub fn call_before(&self) {
        if let Some(before) = &self.before {
            before();
        }
    }

    fn invoke_cb(&self, new_value: &Value, old_value: &Value) {
        if self.user {
            let result = catch_unwind(AssertUnwindSafe(|| {
                (self.cb.borrow_mut())(new_value, old_value);
            }));
            if let Err(payload) = result {
                let message = panic_message(&payload);
                host::host().report(
                    &message,
                    self.expression.as_deref().unwrap_or("<watcher callback>"),
                );
            }
        } else {
            (self.cb.borrow_mut())(new_value, old_value);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "watcher panicked with a non-string payload".to_string()
    }
}
