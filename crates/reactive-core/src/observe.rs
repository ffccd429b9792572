//! Free functions making up the public observation surface:
//! `observe`/`define_reactive`/`set`/`del`/`toggle_observing`.
//!
//! Every `Record`/`Sequence` is already reactive by construction —
//! this crate has no plain-object-becomes-reactive step the way a
//! dynamically-typed host would need, since Rust has no dynamic
//! object type (see `value.rs`'s module doc). What `observe()` does
//! here is the bookkeeping layered on top of installing accessors:
//! mark root instances, and walk children so nested containers'
//! `vm_count` bookkeeping is consistent top-down.

use std::cell::Cell;

use crate::record::Record;
use crate::sequence::Sequence;
use crate::value::Value;

thread_local! {
    /// Gate consulted by `observe()`; flipped off during, e.g., SSR
    /// hydration passes that must not re-establish reactivity.
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Whether `observe()` currently does anything at all.
#[must_use]
pub fn should_observe() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Flip the `observe()` gate.
pub fn toggle_observing(value: bool) {
    SHOULD_OBSERVE.with(|c| c.set(value));
}

/// Walk a value, marking `Record`s as an observed root when
/// `as_root` is set and recursing into children. Non-container
/// primitives are a no-op — they are never observed.
pub fn observe(value: &Value, as_root: bool) {
    if !should_observe() {
        return;
    }
    match value {
        Value::Record(record) => observe_record(record, as_root),
        Value::Sequence(sequence) => observe_sequence(sequence, as_root),
        _ => {}
    }
}

fn observe_record(record: &Record, as_root: bool) {
    if as_root {
        record.mark_observed_root();
    }
    for key in record.keys() {
        if let Some(child) = record.peek(&key) {
            observe(&child, false);
        }
    }
}

fn observe_sequence(sequence: &Sequence, as_root: bool) {
    if as_root {
        sequence.mark_observed_root();
    }
    for i in 0..sequence.len() {
        if let Some(child) = sequence.peek(i) {
            observe(&child, false);
        }
    }
}

/// Explicitly define a reactive field on `record`, bypassing the
/// root-record new-key rejection — the free-function form of
/// [`Record::define_reactive`] for call sites that only hold a
/// [`Value`].
pub fn define_reactive(record: &Record, key: &str, value: Value, read_only: bool) {
    record.define_reactive(key, value, read_only);
}

/// Write `key` on `record`, or index `index` on a `Sequence` value —
/// dispatches by the shape of `target`. Returns `false` if `target` is
/// not a container or the operation was rejected (read-only, or a
/// new key on a root record).
pub fn set(target: &Value, key: &str, value: Value) -> bool {
    match target {
        Value::Record(record) => record.set(key, value).is_ok(),
        Value::Sequence(sequence) => match key.parse::<usize>() {
            Ok(index) if index < sequence.len() => {
                sequence.splice(index, 1, vec![value]);
                true
            }
            Ok(index) => {
                sequence.splice(index, 0, vec![value]);
                true
            }
            Err(_) => false,
        },
        _ => false,
    }
}

/// Remove `key` from `record`, or splice out `index` on a `Sequence`
/// value.
pub fn del(target: &Value, key: &str) {
    match target {
        Value::Record(record) => record.del(key),
        Value::Sequence(sequence) => {
            if let Ok(index) = key.parse::<usize>() {
                sequence.splice(index, 1, Vec::new());
            }
        }
        _ => {}
    }
}
