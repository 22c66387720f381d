use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{error::RuntimeError, interpreter::evaluator::core::EvalResult};

/// Safely converts a [`BigInt`] to an `i64` if and only if it fits.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` naming `what` if the value is
/// out of range.
///
/// # Example
/// ```
/// use num_bigint::BigInt;
/// use rill::util::num::bigint_to_i64_checked;
///
/// let v = BigInt::from(42);
/// assert_eq!(bigint_to_i64_checked(&v, "index").unwrap(), 42);
/// ```
pub fn bigint_to_i64_checked(value: &BigInt, what: &str) -> EvalResult<i64> {
    value.to_i64()
         .ok_or_else(|| out_of_range(value, what))
}

/// Safely converts a [`BigInt`] to a `u32` if and only if it is
/// non-negative and fits.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` naming `what` if the value is
/// negative or out of range.
pub fn bigint_to_u32_checked(value: &BigInt, what: &str) -> EvalResult<u32> {
    value.to_u32()
         .ok_or_else(|| out_of_range(value, what))
}

/// Safely converts a [`BigInt`] to a `u64` if and only if it is
/// non-negative and fits.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` naming `what` if the value is
/// negative or out of range.
pub fn bigint_to_u64_checked(value: &BigInt, what: &str) -> EvalResult<u64> {
    value.to_u64()
         .ok_or_else(|| out_of_range(value, what))
}

/// Safely converts a [`BigInt`] to a `usize` if and only if it is
/// non-negative and fits. Used for shift counts, where a negative or
/// word-sized count is never meaningful.
///
/// # Errors
/// Returns `RuntimeError::InvalidArgument` naming `what` if the value is
/// negative or out of range.
pub fn bigint_to_usize_checked(value: &BigInt, what: &str) -> EvalResult<usize> {
    value.to_usize()
         .ok_or_else(|| out_of_range(value, what))
}

fn out_of_range(value: &BigInt, what: &str) -> RuntimeError {
    RuntimeError::InvalidArgument { details: format!("{what} {value} is out of range") }
}
