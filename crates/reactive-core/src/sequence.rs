//! `Sequence`: the other observable container shape — an ordered list
//! with exactly seven intercepted mutators. Raw index assignment and
//! length-shortening are **not** intercepted; only these explicit
//! methods fire the structural dep.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;

use crate::dep::Dep;
use crate::value::Value;

struct SequenceInner {
    items: Vec<Value>,
    structural_dep: Dep,
    vm_count: Cell<u32>,
}

/// A reactive sequence. Cloning shares identity (`Rc`).
#[derive(Clone)]
pub struct Sequence {
    inner: Rc<RefCell<SequenceInner>>,
}

impl Sequence {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<Value>) -> Self {
        for item in &items {
            crate::observe::observe(item, false);
        }
        Self {
            inner: Rc::new(RefCell::new(SequenceInner {
                items,
                structural_dep: Dep::new(),
                vm_count: Cell::new(0),
            })),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity for cycle detection in `deep.rs`'s traversal.
    #[must_use]
    pub(crate) fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn vm_count(&self) -> u32 {
        self.inner.borrow().vm_count.get()
    }

    pub fn mark_observed_root(&self) {
        let inner = self.inner.borrow();
        inner.vm_count.set(inner.vm_count.get() + 1);
    }

    #[must_use]
    pub(crate) fn structural_dep(&self) -> Dep {
        self.inner.borrow().structural_dep.clone()
    }

    /// Getter step 2c for a sequence that is itself the value being
    /// read: register the structural dep of each element that is a
    /// container, without recursing past that one level.
    pub(crate) fn depend_on_element_structural_deps(&self) {
        let inner = self.inner.borrow();
        for item in &inner.items {
            match item {
                Value::Record(r) => r.structural_dep().depend(),
                Value::Sequence(s) => s.structural_dep().depend(),
                _ => {}
            }
        }
    }

    /// Read slot `i`, subscribing to the structural dep — a sequence
    /// has no per-index deps, so any read depends on the whole
    /// container. If the slot holds a nested container, also
    /// registers that container's own structural dep (and, one level
    /// further, its elements' structural deps if it is itself a
    /// sequence).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        let inner = self.inner.borrow();
        inner.structural_dep.depend();
        let value = inner.items.get(index).cloned();
        drop(inner);
        if let Some(value) = &value {
            value.depend_as_child();
        }
        value
    }

    /// Read slot `i` without registering a dependency. See
    /// [`crate::record::Record::peek`].
    #[must_use]
    pub(crate) fn peek(&self, index: usize) -> Option<Value> {
        self.inner.borrow().items.get(index).cloned()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        let inner = self.inner.borrow();
        inner.structural_dep.depend();
        inner.items.clone()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let (result, structural) = {
            let mut inner = self.inner.borrow_mut();
            let result = f(&mut inner.items);
            (result, inner.structural_dep.clone())
        };
        structural.notify();
        result
    }

    pub fn push(&self, value: Value) {
        crate::observe::observe(&value, false);
        self.mutate(|items| items.push(value));
    }

    pub fn pop(&self) -> Option<Value> {
        self.mutate(Vec::pop)
    }

    /// Remove and return the first item, shifting the rest down.
    pub fn shift(&self) -> Option<Value> {
        self.mutate(|items| if items.is_empty() { None } else { Some(items.remove(0)) })
    }

    /// Insert at the front, shifting the rest up.
    pub fn unshift(&self, value: Value) {
        crate::observe::observe(&value, false);
        self.mutate(|items| items.insert(0, value));
    }

    /// Remove `delete_count` items starting at `start` and insert
    /// `inserted` in their place, returning the removed items.
    /// `start` beyond the current length extends the sequence with
    /// `Value::Null` padding before inserting.
    pub fn splice(&self, start: usize, delete_count: usize, inserted: Vec<Value>) -> Vec<Value> {
        for value in &inserted {
            crate::observe::observe(value, false);
        }
        self.mutate(|items| {
            if start > items.len() {
                items.resize_with(start, || Value::Null);
            }
            let end = (start + delete_count).min(items.len());
            let removed: Vec<Value> = items.splice(start..end, inserted).collect();
            removed
        })
    }

    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) {
        self.mutate(|items| items.sort_by(compare));
    }

    pub fn reverse(&self) {
        self.mutate(|items| items.reverse());
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_and_fires_structural_dep() {
        let s = Sequence::new();
        s.push(Value::Number(1.0));
        s.push(Value::Number(2.0));
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(1), Some(Value::Number(2.0)));
    }

    #[test]
    fn shift_and_unshift_move_the_front() {
        let s = Sequence::from_vec(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(s.shift(), Some(Value::Number(1.0)));
        assert_eq!(s.len(), 1);
        s.unshift(Value::Number(0.0));
        assert_eq!(s.get(0), Some(Value::Number(0.0)));
    }

    #[test]
    fn splice_replaces_a_range_and_returns_removed() {
        let s = Sequence::from_vec(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
        ]);
        let removed = s.splice(1, 1, vec![Value::Number(9.0), Value::Number(9.5)]);
        assert_eq!(removed, vec![Value::Number(2.0)]);
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(1), Some(Value::Number(9.0)));
    }

    #[test]
    fn splice_past_the_end_pads_with_null() {
        let s = Sequence::from_vec(vec![Value::Number(1.0)]);
        s.splice(3, 0, vec![Value::Number(9.0)]);
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(1), Some(Value::Null));
        assert_eq!(s.get(3), Some(Value::Number(9.0)));
    }

    #[test]
    fn reverse_flips_order() {
        let s = Sequence::from_vec(vec![Value::Number(1.0), Value::Number(2.0)]);
        s.reverse();
        assert_eq!(s.to_vec(), vec![Value::Number(2.0), Value::Number(1.0)]);
    }

    #[test]
    fn clone_shares_identity() {
        let s = Sequence::new();
        let s2 = s.clone();
        s.push(Value::Number(1.0));
        assert_eq!(s2.len(), 1);
        assert!(s.ptr_eq(&s2));
    }
}
