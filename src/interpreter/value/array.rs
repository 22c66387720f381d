use std::{cell::Cell, cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use crate::interpreter::{lexer::IncDec, value::core::Value, value::num::NumVal};

/// A sparse one-dimensional array: a shared mapping from integer index to
/// value.
///
/// Arrays are handles; cloning one clones the handle, not the contents, so
/// a block that received a copied environment still mutates the same
/// array. Reading an index that was never written yields `Null`. There are
/// no bounds.
#[derive(Debug, Clone, Default)]
pub struct SparseArray(Rc<RefCell<BTreeMap<i64, Value>>>);

impl SparseArray {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the value at `index`, `Null` if the slot was never written.
    #[must_use]
    pub fn get(&self, index: i64) -> Value {
        self.0.borrow().get(&index).cloned().unwrap_or(Value::Null)
    }

    /// Writes `value` at `index`.
    pub fn put(&self, index: i64, value: Value) {
        self.0.borrow_mut().insert(index, value);
    }

    /// Number of written slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if no slot was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the written slots in index order, for hosts that render
    /// variables.
    #[must_use]
    pub fn entries(&self) -> Vec<(i64, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(index, value)| (*index, value.clone()))
            .collect()
    }

    /// Returns `true` if both handles refer to the same array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for SparseArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (nth, (index, value)) in self.0.borrow().iter().enumerate() {
            if nth > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// A transient reference to one array slot, produced by evaluating
/// `name[index]`.
///
/// The reference is what makes compound assignment and `++`/`--` on array
/// elements possible: it remembers where to write back. A pending
/// increment or decrement marker travels on the reference and is applied
/// exactly once, on the first read.
#[derive(Debug, Clone)]
pub struct SlotRef {
    array:   SparseArray,
    index:   i64,
    pending: Cell<Option<IncDec>>,
}

impl SlotRef {
    pub(crate) fn new(array: SparseArray, index: i64, pending: Option<IncDec>) -> Self {
        Self { array,
               index,
               pending: Cell::new(pending) }
    }

    /// Reads the slot, applying a pending `++`/`--` marker if the slot
    /// holds a number. A prefix marker updates the slot and returns the
    /// new value; a postfix marker returns the old value and stores the
    /// new one. Non-numeric or absent slots read as-is.
    #[must_use]
    pub fn get(&self) -> Value {
        let current = self.array.get(self.index);
        let Some(step) = self.pending.take() else {
            return current;
        };
        let Value::Num(number) = current else {
            return current;
        };
        let one = NumVal::one();
        let updated = if step.is_increment() {
            number.add(&one)
        } else {
            number.subtract(&one)
        };
        self.array.put(self.index, Value::Num(updated.clone()));
        if step.is_pre() {
            Value::Num(updated)
        } else {
            Value::Num(number)
        }
    }

    /// Reads the slot without touching any pending marker.
    #[must_use]
    pub fn peek(&self) -> Value {
        self.array.get(self.index)
    }

    /// Writes `value` into the slot.
    pub fn set(&self, value: Value) {
        self.array.put(self.index, value);
    }
}
