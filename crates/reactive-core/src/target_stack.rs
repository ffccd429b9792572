//! The process-wide (here: thread-local) stack of the watcher that is
//! currently evaluating. `Dep::depend` consults the top of this stack
//! to learn who is reading.

use std::cell::RefCell;
use std::rc::Rc;

use crate::watcher::Watcher;

thread_local! {
    static STACK: RefCell<Vec<Option<Rc<Watcher>>>> = const { RefCell::new(Vec::new()) };
}

/// Push a new current target. Pushing `None` disables tracking for
/// whatever runs until the matching [`pop_target`] — the same
/// "evaluate with tracking off" trick `batch.rs`'s
/// `is_batching`/nesting uses, applied to dependency collection
/// instead of deferral.
pub fn push_target(target: Option<Rc<Watcher>>) {
    STACK.with(|s| s.borrow_mut().push(target));
}

/// Pop the most recently pushed target. Every `push_target` must be
/// matched by exactly one `pop_target`, normally from a drop guard in
/// `Watcher::get`.
pub fn pop_target() {
    STACK.with(|s| {
        s.borrow_mut().pop();
    });
}

/// The watcher that is currently evaluating, if any.
#[must_use]
pub fn current() -> Option<Rc<Watcher>> {
    STACK.with(|s| s.borrow().last().cloned().flatten())
}
