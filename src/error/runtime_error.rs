use crate::error::{ErrorKind, ParseError};

#[derive(Debug)]
/// Represents all errors that can occur while evaluating expressions and
/// walking statement trees.
///
/// Because this dialect parses each statement line at the moment it
/// executes, parse failures also surface at run time; they are carried in
/// the [`Parse`](Self::Parse) variant. Evaluation failures are wrapped with
/// the text of the expression they occurred in, nesting across user-defined
/// function calls. [`Stopped`](Self::Stopped) is never wrapped so that
/// cancellation stays recognisable at the outermost caller.
pub enum RuntimeError {
    /// A statement line failed to parse.
    Parse(ParseError),
    /// An evaluation failure, annotated with the expression it occurred in.
    InExpression {
        /// The expression being evaluated.
        expr:   String,
        /// The underlying failure.
        source: Box<RuntimeError>,
    },
    /// The line observer requested cancellation.
    Stopped,
    /// A boolean value was expected, but not found.
    ExpectedBoolean {
        /// What required the boolean, e.g. `"if condition"`.
        what: String,
    },
    /// A numeric value was expected, but not found.
    ExpectedNumber {
        /// The operator or function that required a number.
        op: String,
    },
    /// The operand types are not usable with this operator.
    IllegalOperands {
        /// The operator that was applied.
        op: String,
    },
    /// `null` was used under an ordering comparison.
    NullOrdering {
        /// The comparison operator.
        op: String,
    },
    /// An integer-only operation received a decimal operand.
    TypeMismatch {
        /// The operator or function that was applied.
        op: String,
    },
    /// An argument was invalid or out of range.
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
    },
    /// Attempted division by zero.
    DivisionByZero,
    /// A numeric literal could not be parsed.
    BadLiteral {
        /// The literal text.
        text: String,
    },
    /// An indexed name is bound to something other than an array.
    NotAnArray {
        /// The name of the binding.
        name: String,
    },
    /// An array index was not an integer, or out of range.
    BadIndex {
        /// Details about the index.
        details: String,
    },
    /// The left-hand side of an assignment is not a variable or array slot.
    NotAssignable {
        /// The assignment operator that was applied.
        op: String,
    },
    /// An operator token survived parsing but has no evaluation rule.
    UnknownOperator {
        /// The operator text.
        op: String,
    },
    /// Called an unknown function.
    UnknownFunction {
        /// The name of the function.
        name: String,
    },
    /// An operator or function needed more values than the stack held.
    MissingOperand,
    /// The value stack did not reduce to a single result.
    StackImbalance,
    /// The interpreter reached a state it cannot recover from.
    Internal {
        /// Details about the inconsistency.
        details: String,
    },
}

impl RuntimeError {
    /// Annotates this error with the expression text it occurred in.
    /// `Stopped` passes through untouched so cancellation is never masked.
    #[must_use]
    pub fn in_expression(self, expr: &str) -> Self {
        match self {
            Self::Stopped => Self::Stopped,
            other => Self::InExpression { expr:   expr.to_string(),
                                          source: Box::new(other), },
        }
    }

    /// Returns `true` if this error is the cooperative-cancellation signal.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns the [`ErrorKind`] for this error, looking through expression
    /// annotations to the underlying failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(source) => source.kind(),
            Self::InExpression { source, .. } => source.kind(),
            Self::Stopped => ErrorKind::Stopped,
            Self::ExpectedBoolean { .. }
            | Self::ExpectedNumber { .. }
            | Self::IllegalOperands { .. }
            | Self::NullOrdering { .. }
            | Self::InvalidArgument { .. }
            | Self::DivisionByZero
            | Self::NotAnArray { .. }
            | Self::BadIndex { .. } => ErrorKind::Type,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::BadLiteral { .. } | Self::NotAssignable { .. } | Self::UnknownOperator { .. } => {
                ErrorKind::Syntax
            },
            Self::UnknownFunction { .. } => ErrorKind::Name,
            Self::MissingOperand | Self::StackImbalance | Self::Internal { .. } => {
                ErrorKind::Internal
            },
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(source) => write!(f, "{source}"),
            Self::InExpression { expr, source } => {
                write!(f, "Error evaluating '{expr}': {source}")
            },
            Self::Stopped => write!(f, "Stopped."),
            Self::ExpectedBoolean { what } => write!(f, "Expected boolean for {what}."),
            Self::ExpectedNumber { op } => write!(f, "Expected number for '{op}'."),
            Self::IllegalOperands { op } => write!(f, "Illegal operands for operator '{op}'."),
            Self::NullOrdering { op } => {
                write!(f, "Cannot compare against null with operator '{op}'.")
            },
            Self::TypeMismatch { op } => write!(f, "Integer operands required for '{op}'."),
            Self::InvalidArgument { details } => write!(f, "Invalid argument: {details}."),
            Self::DivisionByZero => write!(f, "Division by zero."),
            Self::BadLiteral { text } => write!(f, "Malformed number literal '{text}'."),
            Self::NotAnArray { name } => write!(f, "'{name}' is not an array."),
            Self::BadIndex { details } => write!(f, "Bad array index: {details}."),
            Self::NotAssignable { op } => {
                write!(f, "Assignment '{op}' to something that is not a variable or array slot.")
            },
            Self::UnknownOperator { op } => write!(f, "Unknown operator '{op}'."),
            Self::UnknownFunction { name } => write!(f, "Unknown function '{name}'."),
            Self::MissingOperand => write!(f, "Operator is missing an operand."),
            Self::StackImbalance => write!(f, "Leftover values on the stack after evaluation."),
            Self::Internal { details } => write!(f, "Internal error: {details}."),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(source) => Some(source),
            Self::InExpression { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for RuntimeError {
    fn from(source: ParseError) -> Self {
        Self::Parse(source)
    }
}
