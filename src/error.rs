/// Errors raised while tokenizing an expression or converting it to postfix
/// form, and while checking the shape of statement lines.
pub mod parse_error;
/// Errors raised while evaluating postfix expressions and walking statement
/// trees, including the cooperative-cancellation signal.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::RuntimeError;

/// Coarse classification of every error the interpreter can produce.
///
/// Each [`ParseError`] and [`RuntimeError`] variant maps onto exactly one
/// kind, so hosts can branch on the category without matching the full
/// variant set. `Stopped` is deliberately a kind of its own: it marks a
/// cooperative cancellation requested through the line observer, not a
/// failure of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source: unbalanced grouping, unknown characters or
    /// operators, bad statement shapes, assignment to a non-target.
    Syntax,
    /// A value of the wrong type reached an operation: non-boolean
    /// conditions, ordering comparisons against `null`, bad indexes.
    Type,
    /// An integer-only operation (bitwise, shift, modulo, `pow` exponents)
    /// received a decimal operand.
    TypeMismatch,
    /// A function name could not be resolved.
    Name,
    /// The evaluator reached an inconsistent state, such as a value stack
    /// that did not reduce to a single result.
    Internal,
    /// Execution was cancelled from the line observer.
    Stopped,
}
