//! Crate-wide tunables, mirroring `ftui-runtime`'s
//! `queueing_scheduler::SchedulerConfig` convention: a plain struct with
//! a `Default` impl, held behind a thread-local `RefCell` so embedders
//! can change it per-thread without plumbing a handle through every
//! call site.

use std::cell::RefCell;

/// Whether the scheduler defers a flush to the host's microtask queue
/// (`true`, the default) or runs it inline as soon as the queue
/// transitions from empty to non-empty (`false`).
#[derive(Clone, Copy, Debug)]
pub struct ReactiveConfig {
    pub async_flush: bool,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self { async_flush: true }
    }
}

thread_local! {
    static CONFIG: RefCell<ReactiveConfig> = RefCell::new(ReactiveConfig::default());
}

/// Replace the active configuration.
pub fn set_config(config: ReactiveConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// The active configuration.
#[must_use]
pub fn config() -> ReactiveConfig {
    CONFIG.with(|c| *c.borrow())
}

/// Shorthand for `config().async_flush` — the hot path consulted by
/// both `Dep::notify` (sort-on-sync) and `scheduler::queue_watcher`
/// (inline-flush-on-sync).
#[must_use]
pub fn is_async() -> bool {
    CONFIG.with(|c| c.borrow().async_flush)
}
