/// Sparse arrays and the transient slot references that make array
/// elements assignable.
pub mod array;
/// The `Value` enum and its conversions.
pub mod core;
/// Arbitrary-precision numbers.
pub mod num;
