//! `Record`: one of the two observable container shapes (see
//! [`crate::value`]) — an insertion-ordered string-keyed map where each
//! field carries its own [`Dep`], plus one structural `Dep` shared by
//! the whole container for shape changes (key add/remove).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::dep::Dep;
use crate::error::ReactiveError;
use crate::value::Value;

struct Field {
    value: Value,
    dep: Dep,
    read_only: bool,
}

struct RecordInner {
    fields: IndexMap<String, Field>,
    /// Fires when a key is added or removed — never on an in-place
    /// value write, which only fires the field's own `dep`.
    structural_dep: Dep,
    /// How many times `observe()` has marked this record as a
    /// component root. Tracked so repeated `observe(&value, true)`
    /// calls on the same record stay idempotent.
    vm_count: Cell<u32>,
    is_root: bool,
}

/// A reactive record. Cloning shares identity (`Rc`), matching
/// "observing an already-observed value is idempotent."
#[derive(Clone)]
pub struct Record {
    inner: Rc<RefCell<RecordInner>>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(false)
    }

    #[must_use]
    pub fn with_root(is_root: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RecordInner {
                fields: IndexMap::new(),
                structural_dep: Dep::new(),
                vm_count: Cell::new(0),
                is_root,
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
    pub fn is_root(&self) -> bool {
        self.inner.borrow().is_root
    }

    #[must_use]
    pub fn vm_count(&self) -> u32 {
        self.inner.borrow().vm_count.get()
    }

    /// Mark this record as observed as a component root one more
    /// time. Called by [`crate::observe::observe`]; idempotent in the
    /// sense that it only affects `vm_count` bookkeeping, never
    /// re-wraps already-reactive fields.
    pub fn mark_observed_root(&self) {
        let inner = self.inner.borrow();
        inner.vm_count.set(inner.vm_count.get() + 1);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().fields.contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().fields.keys().cloned().collect()
    }

    /// Read a field without registering any dependency. Used for
    /// internal bookkeeping walks (`observe.rs`) that must not
    /// attribute a read to whatever watcher happens to be evaluating
    /// at the time.
    #[must_use]
    pub(crate) fn peek(&self, key: &str) -> Option<Value> {
        self.inner.borrow().fields.get(key).map(|f| f.value.clone())
    }

    /// Read a field, subscribing the current target to it. If the
    /// value read is itself a container, also subscribes to that
    /// child's structural dep (Open Question 2: resolved as
    /// "unconditional") and, if the child is a sequence, to the
    /// structural dep of each of its elements that is itself a
    /// container, one level deep.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        let field = inner.fields.get(key)?;
        field.dep.depend();
        let value = field.value.clone();
        drop(inner);
        value.depend_as_child();
        Some(value)
    }

    /// The structural dep, for child-read registration by
    /// `Sequence`/other `Record`s and for `observe.rs`'s free
    /// functions.
    #[must_use]
    pub(crate) fn structural_dep(&self) -> Dep {
        self.inner.borrow().structural_dep.clone()
    }

    /// Write an existing key in place, or — for records that are not
    /// a component root — add a brand-new key. Adding a new key onto
    /// a root record is rejected; use [`Record::define_reactive`]
    /// instead.
    pub fn set(&self, key: &str, value: Value) -> Result<(), ReactiveError> {
        let existing_dep = {
            let inner = self.inner.borrow();
            inner.fields.get(key).map(|f| (f.read_only, f.value.clone(), f.dep.clone()))
        };

        if let Some((read_only, old_value, dep)) = existing_dep {
            if read_only {
                tracing::warn!(key, "attempted write to a read-only reactive property");
                return Err(ReactiveError::ReadOnlyWrite);
            }
            if old_value == value {
                return Ok(());
            }
            crate::observe::observe(&value, false);
            {
                let mut inner = self.inner.borrow_mut();
                if let Some(field) = inner.fields.get_mut(key) {
                    field.value = value;
                }
            }
            dep.notify();
            return Ok(());
        }

        if self.is_root() {
            tracing::warn!(
                key,
                "cannot add reactive key {key:?} to a root record after creation; \
                 use define_reactive instead"
            );
            return Ok(());
        }

        crate::observe::observe(&value, false);
        let structural = {
            let mut inner = self.inner.borrow_mut();
            inner.fields.insert(
                key.to_string(),
                Field { value, dep: Dep::new(), read_only: false },
            );
            inner.structural_dep.clone()
        };
        structural.notify();
        Ok(())
    }

    /// Remove a key, firing the structural dep if it existed.
    /// Removing an absent key is a silent no-op.
    pub fn del(&self, key: &str) {
        let (removed, structural) = {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.fields.shift_remove(key).is_some();
            (removed, inner.structural_dep.clone())
        };
        if removed {
            structural.notify();
        }
    }

    /// Explicitly define a reactive field, bypassing the root-record
    /// new-key rejection in [`Record::set`]. This is the helper spec
    /// §4.3/§6 refers to as the escape hatch for adding reactive state
    /// after construction.
    pub fn define_reactive(&self, key: &str, value: Value, read_only: bool) {
        crate::observe::observe(&value, false);
        let is_new = !self.contains_key(key);
        let structural = {
            let mut inner = self.inner.borrow_mut();
            inner.fields.insert(
                key.to_string(),
                Field { value, dep: Dep::new(), read_only },
            );
            inner.structural_dep.clone()
        };
        if is_new {
            structural.notify();
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}
