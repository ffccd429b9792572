//! Deep traversal for `deep: true` watchers: visit every nested
//! reactive property so the watcher subscribes to all of them, not
//! just the ones the getter happened to read directly.
//!
//! The `seen` set is allocated fresh on every call to
//! [`traverse_root`], never reused across calls —
//! a module-global `seen` would leak identities across unrelated
//! watchers and, worse, would make the second `deep` watcher over the
//! same graph see nothing (everything already "seen" by the first).

use rustc_hash::FxHashSet;

use crate::value::Value;

/// Walk `value` and every reactive descendant, registering a
/// dependency on each one along the way (via `Record::get`/
/// `Sequence::get`, both of which call `depend()`).
pub fn traverse_root(value: &Value) {
    let mut seen = FxHashSet::default();
    traverse(value, &mut seen);
}

fn traverse(value: &Value, seen: &mut FxHashSet<usize>) {
    match value {
        Value::Record(record) => {
            let id = record.ptr_id();
            if !seen.insert(id) {
                return;
            }
            for key in record.keys() {
                if let Some(child) = record.get(&key) {
                    traverse(&child, seen);
                }
            }
        }
        Value::Sequence(sequence) => {
            let id = sequence.ptr_id();
            if !seen.insert(id) {
                return;
            }
            for i in 0..sequence.len() {
                if let Some(child) = sequence.get(i) {
                    traverse(&child, seen);
                }
            }
        }
        _ => {}
    }
}
