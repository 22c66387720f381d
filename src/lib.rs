//! # rill
//!
//! rill is a small dynamically-typed scripting language with
//! arbitrary-precision arithmetic. Expressions are parsed into postfix
//! form with a shunting-yard pass and evaluated over a variable
//! environment; statements are grouped by indentation and support
//! `if`/`elif`/`else`, `while`, `for`, and user-defined functions with
//! `return`. A per-line observer callback lets a host step through a
//! script, inspect variables, and cancel execution cooperatively, which
//! is what makes breakpoint-style debugging possible from outside the
//! interpreter.
//!
//! ```
//! use rill::{Functions, Script, Value};
//!
//! let source = "\
//! function sum(a, b)
//!   return a + b
//! total = sum(40, 2)
//! return total";
//! let script = Script::new(source, Functions::new());
//! assert_eq!(script.run().unwrap(), Value::from(42));
//! ```

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
)]
#![allow(clippy::missing_errors_doc)]

/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised while tokenizing,
/// parsing, or evaluating scripts, standardizes their reporting, and maps
/// every variant onto a coarse [`ErrorKind`] so hosts can distinguish
/// syntax problems, type problems, unknown names, internal faults, and
/// cooperative cancellation without matching full variant sets.
pub mod error;
/// Orchestrates the entire process of script execution.
///
/// This module ties together lexing, parsing, evaluation, value
/// representations, the function registry, and the statement walker to
/// provide a complete runtime. It exposes the public API for running
/// scripts and evaluating single expressions.
pub mod interpreter;
/// General utilities for safe numeric conversion.
pub mod util;

pub use crate::{
    error::{ErrorKind, ParseError, RuntimeError},
    interpreter::{
        evaluator::core::{evaluate, Env, EvalResult},
        functions::{builtins, pop_int, pop_num, pop_value, Function, Functions, HostFunction},
        script::{LineObserver, Script, Stopped},
        value::{core::Value, num::NumVal},
    },
};

/// Runs a script that needs no host functions and no observer, returning
/// its `return` value, or `Null` if it never returns one.
///
/// # Errors
/// Returns an error if any line fails to parse or evaluate.
///
/// # Examples
/// ```
/// use rill::{run, Value};
///
/// let result = run("ii = 0\nwhile (ii < 10)\n  ii = ii + 2\nreturn ii").unwrap();
/// assert_eq!(result, Value::from(10));
///
/// // An unknown function is an error.
/// assert!(run("nope(1)").is_err());
/// ```
pub fn run(source: &str) -> Result<Value, RuntimeError> {
    Script::new(source, Functions::new()).run()
}
