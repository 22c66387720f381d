use std::{cmp::Ordering, fmt};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::EvalResult,
        value::{array::{SlotRef, SparseArray},
                num::NumVal},
    },
};

/// Represents a runtime value in the interpreter.
///
/// This enum models every type that can appear in expressions,
/// assignments, function arguments, and conditions. `Ref` is transient: it
/// exists only while an expression evaluates, carrying the write-back
/// location for assignment and `++`/`--`, and collapses to the referenced
/// value before a result leaves the evaluator.
#[derive(Debug, Clone)]
pub enum Value {
    /// An arbitrary-precision number, integer or decimal.
    Num(NumVal),
    /// A string.
    Str(String),
    /// A boolean, produced by comparisons and the logical operators.
    Bool(bool),
    /// The absent value: unset variables and array slots read as `Null`.
    Null,
    /// A sparse array handle.
    Array(SparseArray),
    /// A transient reference to an array slot.
    Ref(SlotRef),
}

impl Value {
    /// Replaces a slot reference with the value it refers to; every other
    /// value passes through. Reading the slot applies any pending
    /// `++`/`--` marker.
    #[must_use]
    pub fn collapse(self) -> Self {
        match self {
            Self::Ref(slot) => slot.get(),
            other => other,
        }
    }

    /// Borrows the numeric payload, or reports which operator needed a
    /// number.
    ///
    /// # Errors
    /// `RuntimeError::ExpectedNumber` for non-numeric values.
    pub fn as_num(&self, op: &str) -> EvalResult<&NumVal> {
        match self {
            Self::Num(number) => Ok(number),
            _ => Err(RuntimeError::ExpectedNumber { op: op.to_string() }),
        }
    }

    /// Returns `true` if the value is [`Null`](Self::Null).
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Num(l), Self::Num(r)) => l.compare(r) == Ordering::Equal,
            (Self::Str(l), Self::Str(r)) => l == r,
            (Self::Bool(l), Self::Bool(r)) => l == r,
            (Self::Null, Self::Null) => true,
            (Self::Array(l), Self::Array(r)) => l.ptr_eq(r),
            _ => false,
        }
    }
}

impl From<NumVal> for Value {
    fn from(v: NumVal) -> Self {
        Self::Num(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Num(NumVal::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl fmt::Display for Value {
    /// The canonical textual representation used by string concatenation:
    /// numbers render as their exact decimal form, booleans as
    /// `true`/`false`, the absent value as `null`, strings as themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Array(a) => write!(f, "{a}"),
            Self::Ref(slot) => write!(f, "{}", slot.peek()),
        }
    }
}
