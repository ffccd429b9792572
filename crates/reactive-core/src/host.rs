//! The boundary this crate shares with its embedder. Component
//! lifecycle, templates, and the event bus all live on the other side
//! of this boundary and are out of this crate's scope — what the core
//! needs from that world is exactly three callbacks, modeled as traits
//! the way `ftui-runtime::subscription::Subscription` models a
//! host-facing event source the runtime drives without depending on
//! its concrete type.

use std::cell::RefCell;
use std::rc::Rc;

/// Schedule a flush callback to run on the host's microtask queue.
/// `SyncHost` runs it inline, which is what the `async_flush: false`
/// configuration mode describes.
pub trait NextTick {
    fn schedule(&self, callback: Box<dyn FnOnce()>);
}

/// Route a caught user getter/callback panic to the host instead of
/// letting it propagate.
pub trait ErrorReporter {
    fn report(&self, message: &str, context: &str);
}

/// Deliver `updated`/`activated` notifications after a flush, over the
/// pre-reset snapshot of affected component instances. Component
/// identity is an opaque `u64` — this crate does not know what a
/// component is, only that some watchers are tagged as belonging to
/// one (`WatcherOptions::owner`, `WatcherOptions::is_render_watcher`).
pub trait LifecycleHooks {
    fn updated(&self, owner: u64);
    fn activated(&self, owner: u64);
}

/// The full host boundary. Blanket-implemented for anything that
/// implements all three pieces individually, so embedders need not
/// name this trait themselves.
pub trait Host: NextTick + ErrorReporter + LifecycleHooks {}
impl<T: NextTick + ErrorReporter + LifecycleHooks> Host for T {}

/// A host that needs no real event loop: `NextTick::schedule` runs the
/// callback immediately, errors are logged via `tracing::error!`, and
/// lifecycle hooks are logged via `tracing::debug!`. Useful standalone
/// and for tests; a real embedder wires `NextTick` to its actual
/// microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncHost;

impl NextTick for SyncHost {
    fn schedule(&self, callback: Box<dyn FnOnce()>) {
        callback();
    }
}

impl ErrorReporter for SyncHost {
    fn report(&self, message: &str, context: &str) {
        tracing::error!(context, "{message}");
    }
}

impl LifecycleHooks for SyncHost {
    fn updated(&self, owner: u64) {
        tracing::debug!(owner, "component updated");
    }

    fn activated(&self, owner: u64) {
        tracing::debug!(owner, "component activated");
    }
}

thread_local! {
    static HOST: RefCell<Rc<dyn Host>> = RefCell::new(Rc::new(SyncHost));
}

/// Install a different host for this thread.
pub fn set_host(host: Rc<dyn Host>) {
    HOST.with(|h| *h.borrow_mut() = host);
}

/// Reset this thread's host back to [`SyncHost`].
pub fn reset_host() {
    set_host(Rc::new(SyncHost));
}

/// The active host.
#[must_use]
pub fn host() -> Rc<dyn Host> {
    HOST.with(|h| Rc::clone(&h.borrow()))
}
