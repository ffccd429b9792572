//! Fine-grained dependency tracking and batched scheduling.
//!
//! Five pieces cooperate: a [`dep::Dep`] is a subscription channel; a
//! thread-local [`target_stack`] tracks which [`watcher::Watcher`] is
//! currently evaluating so reads can subscribe it automatically;
//! [`record::Record`] and [`sequence::Sequence`] are the two reactive
//! container shapes a [`value::Value`] can hold; and the
//! [`scheduler`] batches and deterministically re-runs watchers a
//! `Dep::notify` woke up. Component lifecycle, templates, and an
//! event bus are out of scope — this crate only reaches the rest of a
//! host application through the traits in [`host`].

#![forbid(unsafe_code)]

pub mod config;
pub mod deep;
pub mod dep;
pub mod error;
pub mod host;
pub mod observe;
pub mod path;
pub mod record;
pub mod scheduler;
pub mod sequence;
pub mod target_stack;
pub mod value;
pub mod watcher;

pub use config::{config, set_config, ReactiveConfig};
pub use dep::Dep;
pub use error::ReactiveError;
pub use host::{host, reset_host, set_host, ErrorReporter, Host, LifecycleHooks, NextTick, SyncHost};
pub use observe::{define_reactive, del, observe, set, should_observe, toggle_observing};
pub use record::Record;
pub use scheduler::{flush_scheduler_queue, queue_activated, queue_watcher, MAX_UPDATE_COUNT};
pub use sequence::Sequence;
pub use target_stack::{current as current_target, pop_target, push_target};
pub use value::Value;
pub use watcher::{Watcher, WatcherOptions};
