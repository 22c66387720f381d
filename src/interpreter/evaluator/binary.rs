use std::cmp::Ordering;

use crate::{
    error::RuntimeError,
    interpreter::{evaluator::core::EvalResult, value::core::Value},
};

/// Applies a comparison operator.
///
/// Two strings compare lexicographically, two numbers numerically (and
/// scale-invariantly). `Null` participates only in `==`/`!=`, where it
/// equals nothing but `Null`; under an ordering operator it is an error.
/// Every other pairing, booleans included, is an error.
///
/// # Errors
/// `NullOrdering` for `null` under `<`/`<=`/`>`/`>=`, `IllegalOperands`
/// for unsupported pairings.
pub fn compare(op: &str, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let ordering = match (lhs, rhs) {
        (Value::Null, _) | (_, Value::Null) => {
            let both_null = lhs.is_null() && rhs.is_null();
            return match op {
                "==" => Ok(Value::Bool(both_null)),
                "!=" => Ok(Value::Bool(!both_null)),
                _ => Err(RuntimeError::NullOrdering { op: op.to_string() }),
            };
        },
        (Value::Str(l), Value::Str(r)) => l.cmp(r),
        (Value::Num(l), Value::Num(r)) => l.compare(r),
        _ => return Err(RuntimeError::IllegalOperands { op: op.to_string() }),
    };
    let result = match op {
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        "==" => ordering == Ordering::Equal,
        "!=" => ordering != Ordering::Equal,
        _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
    };
    Ok(Value::Bool(result))
}

/// Applies `+`: numeric addition, or string concatenation when either
/// operand is a string. The non-string operand is rendered through its
/// canonical textual representation.
///
/// # Errors
/// `IllegalOperands` when neither side is a string and the operands are
/// not both numbers.
pub fn add(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Str(l), r) => Ok(Value::Str(format!("{l}{r}"))),
        (l, Value::Str(r)) => Ok(Value::Str(format!("{l}{r}"))),
        (Value::Num(l), Value::Num(r)) => Ok(Value::Num(l.add(r))),
        _ => Err(RuntimeError::IllegalOperands { op: "+".to_string() }),
    }
}

/// Applies `-`, `*`, `/`, or `%` (and their compound-assignment spellings)
/// to two numbers.
///
/// # Errors
/// `ExpectedNumber` for non-numeric operands, plus whatever the numeric
/// operation itself reports (division by zero, decimal modulo).
pub fn arithmetic(op: &str, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let l = lhs.as_num(op)?;
    let r = rhs.as_num(op)?;
    let result = match op {
        "-" | "-=" => l.subtract(r),
        "*" | "*=" => l.multiply(r),
        "/" | "/=" => l.divide(r)?,
        "%" | "%=" => l.modulo(r)?,
        _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
    };
    Ok(Value::Num(result))
}

/// Applies `&`, `|`, or `^` — logically on two booleans, bitwise on two
/// integers. `&&` and `||` reuse the same rules; by the time one of them
/// executes, the gate sentinel has already decided that both operands were
/// needed.
///
/// # Errors
/// `IllegalOperands` for mixed or unsupported operand types,
/// `TypeMismatch` for decimal numbers.
pub fn logic(op: &str, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Bool(l), Value::Bool(r)) => {
            let result = match op {
                "&" | "&&" => *l && *r,
                "|" | "||" => *l || *r,
                "^" => l != r,
                _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
            };
            Ok(Value::Bool(result))
        },
        (Value::Num(l), Value::Num(r)) => {
            let result = match op {
                "&" | "&&" => l.and(r)?,
                "|" | "||" => l.or(r)?,
                "^" => l.xor(r)?,
                _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
            };
            Ok(Value::Num(result))
        },
        _ => Err(RuntimeError::IllegalOperands { op: op.to_string() }),
    }
}

/// Applies a shift operator to two numbers.
///
/// # Errors
/// `ExpectedNumber` for non-numeric operands, `TypeMismatch` for
/// decimals, `InvalidArgument` for unusable shift counts.
pub fn shift(op: &str, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let l = lhs.as_num(op)?;
    let r = rhs.as_num(op)?;
    let result = match op {
        "<<" => l.shl(r)?,
        ">>" => l.shr(r)?,
        ">>>" => l.ushr(r)?,
        _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
    };
    Ok(Value::Num(result))
}
