//! Manual `Display`/`std::error::Error` impls, following the
//! hand-rolled `CycleError` convention in `ftui-layout::dep_graph` —
//! no `thiserror` dependency here either.

use std::fmt;

/// Errors surfaced by the public API. Most faults in this crate are
/// not propagated as `Result`s at all — a read-only write or an
/// invalid path is a diagnostic (a logged warning and a no-op), not a
/// recoverable failure a caller is expected to handle inline. This
/// type exists for the smaller set of operations where the caller
/// really does need to branch on the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// A write was attempted against a field defined read-only via
    /// `define_reactive(..., read_only: true)`.
    ReadOnlyWrite,
    /// A dotted-path watcher expression contained a segment that is
    /// not a valid identifier.
    InvalidPath(String),
    /// A watcher re-queued itself more than `MAX_UPDATE_COUNT` times
    /// within a single flush; the flush aborted to avoid looping
    /// forever.
    MaxUpdateCountExceeded { id: u64 },
}

impl fmt::Display for ReactiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactiveError::ReadOnlyWrite => {
                write!(f, "cannot assign to a read-only reactive property")
            }
            ReactiveError::InvalidPath(path) => {
                write!(f, "invalid watcher path expression: {path:?}")
            }
            ReactiveError::MaxUpdateCountExceeded { id } => write!(
                f,
                "watcher {id} exceeded the maximum update count in a single flush; \
                 you may have a circular dependency"
            ),
        }
    }
}

impl std::error::Error for ReactiveError {}
