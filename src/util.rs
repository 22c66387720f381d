/// Checked conversions from arbitrary-precision integers to the machine
/// integers used for shift counts, bit positions, radixes, and array
/// indexes.
pub mod num;
