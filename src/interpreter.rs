/// The evaluator module executes postfix token vectors and computes
/// results.
///
/// The evaluator walks a postfix vector with a value stack, performs all
/// arithmetic, comparison, logical, and assignment operations, dispatches
/// function calls through the registry, and implements short-circuit
/// elision via gate sentinels and skip mode.
///
/// # Responsibilities
/// - Evaluates postfix vectors against a variable environment.
/// - Recovers assignment targets and writes them back.
/// - Reports runtime errors annotated with the offending expression.
pub mod evaluator;
/// The function registry: host capabilities, script-declared functions,
/// and the built-ins.
///
/// # Responsibilities
/// - Defines the `HostFunction` trait and the `Function` registry entry.
/// - Binds call arguments and runs user-defined function bodies.
/// - Provides the built-in numeric, bit, and clock functions.
pub mod functions;
/// The lexer module tokenizes one expression for the parser.
///
/// A raw pass recognises literals, identifiers, strings, and operators;
/// a contextual pass classifies identifiers by what follows them, folds
/// signs into adjacent literals, pairs `&&`/`||` with their gate
/// sentinels, and fuses prefix `++`/`--` markers.
///
/// # Responsibilities
/// - Converts expression text into the parser's token stream.
/// - Reports unknown characters as syntax errors.
pub mod lexer;
/// The parser module converts infix token streams to postfix.
///
/// # Responsibilities
/// - Runs the shunting-yard reordering with grouping and calls.
/// - Fuses postfix `++`/`--` markers.
/// - Extracts function parameter lists from declarations.
pub mod parser;
/// The script module preprocesses source text and walks statements.
///
/// # Responsibilities
/// - Normalises quotes, strips comments, folds indentation into a tree.
/// - Implements `if`/`elif`/`else`, `while`, `for`, `function`, `return`.
/// - Invokes the per-line observer and handles cancellation.
pub mod script;
/// The value module defines the runtime data types.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported variants.
/// - Implements arbitrary-precision numerics with integer/decimal
///   promotion.
/// - Provides sparse arrays and the slot references behind assignment.
pub mod value;
