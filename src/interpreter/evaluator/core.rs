use std::{collections::HashMap, thread, time::Duration};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::binary,
        functions::{builtins, pop, Functions},
        lexer::{Token, TokenKind},
        parser,
        script::LineObserver,
        value::{array::{SlotRef, SparseArray},
                core::Value,
                num::NumVal},
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// [`RuntimeError`] describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// A variable environment: identifier to value, case-sensitive.
pub type Env = HashMap<String, Value>;

/// How a statement walk ended: normally, or early through `return`.
#[derive(Debug)]
pub enum Flow {
    /// The walk reached the end of its node list.
    Normal,
    /// A `return` statement fired; the value propagates to the enclosing
    /// function call, or becomes the script result at top level.
    Return(Value),
}

/// Stores the runtime state for one script run.
///
/// This struct holds the function registry (built-ins, host functions, and
/// any functions the script declares as it executes) and the optional line
/// observer through which a host steps, inspects, and cancels the run.
/// The expression evaluator borrows it to dispatch calls; the statement
/// interpreter borrows it to drive everything else.
pub struct Context<'h> {
    /// Registered functions, keyed by lowercased name.
    pub functions:        Functions,
    pub(crate) observer: Option<&'h mut dyn LineObserver>,
}

impl<'h> Context<'h> {
    /// Creates a context over a prepared function registry.
    pub fn new(functions: Functions, observer: Option<&'h mut dyn LineObserver>) -> Self {
        Self { functions, observer }
    }

    /// Reports an executed line to the observer, then yields briefly so a
    /// spinning script cannot starve the host's control thread. Does
    /// nothing when no observer is attached.
    ///
    /// # Errors
    /// `RuntimeError::Stopped` if the observer cancelled the run.
    pub(crate) fn line_check(&mut self, number: usize, env: &Env) -> EvalResult<()> {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.line(number, env)
                    .map_err(|_| RuntimeError::Stopped)?;
            thread::sleep(Duration::from_micros(10));
        }
        Ok(())
    }
}

/// Parses and evaluates one infix expression against an environment.
///
/// This is the embedding entry point for hosts that only want the
/// expression engine: the built-ins are always available, `host` supplies
/// any extra functions (keyed case-insensitively), and variables live in
/// `env` across calls.
///
/// # Errors
/// Parse and evaluation failures, annotated with the expression text.
///
/// # Example
/// ```
/// use rill::{evaluate, Env, Functions, Value};
///
/// let mut env = Env::new();
/// evaluate("ii = 5", &mut env, &Functions::new()).unwrap();
/// let v = evaluate("ii * 2 + 1", &mut env, &Functions::new()).unwrap();
/// assert_eq!(v, Value::from(11));
/// ```
pub fn evaluate(expr: &str, env: &mut Env, host: &Functions) -> EvalResult<Value> {
    let mut functions = builtins();
    for (name, function) in host {
        functions.insert(name.to_lowercase(), function.clone());
    }
    let mut ctx = Context::new(functions, None);
    eval_line(expr, env, &mut ctx)
}

/// Parses and evaluates one expression line inside a running script.
pub(crate) fn eval_line(src: &str, env: &mut Env, ctx: &mut Context) -> EvalResult<Value> {
    let tokens = parser::parse(src)?;
    let label = match tokens.first() {
        Some(tag) if tag.kind == TokenKind::Expr => tag.text.clone(),
        _ => src.trim().to_string(),
    };
    eval(&tokens, env, ctx).map_err(|e| e.in_expression(&label))
}

/// Walks a postfix token vector against an environment and produces its
/// single result.
///
/// Literals and variable reads push values; array heads pop an index and
/// push a slot reference; function heads pop their arguments through the
/// registry. A gate sentinel inspects the stack top without consuming it
/// and, when the short-circuit applies, switches the walk into skip mode
/// until the token carrying the matching correlation id passes by. The
/// assignment family recovers its target from the retained slot reference
/// or, for scalars, from the variable token at position 1 of the vector.
///
/// # Errors
/// Any [`RuntimeError`] an operator, function, or the final stack-shape
/// check produces.
pub fn eval(expr: &[Token], env: &mut Env, ctx: &mut Context) -> EvalResult<Value> {
    let mut stack: Vec<Value> = Vec::new();
    let mut skip_until: Option<u32> = None;

    for token in expr {
        if let Some(id) = skip_until {
            if token.gate_id == Some(id) {
                skip_until = None;
            }
            continue;
        }
        match token.kind {
            TokenKind::Expr | TokenKind::Comma => {},
            TokenKind::Val => stack.push(Value::Num(NumVal::parse(&token.text)?)),
            TokenKind::Str => stack.push(Value::Str(token.text.clone())),
            TokenKind::Var => {
                let value = read_variable(token, env);
                stack.push(value);
            },
            TokenKind::Array => {
                let index = match pop(&mut stack)?.collapse() {
                    Value::Num(number) => number.as_index()?,
                    other => {
                        return Err(RuntimeError::BadIndex { details: format!("expected an integer index, got {other}") });
                    },
                };
                let array = array_binding(&token.text, env)?;
                stack.push(Value::Ref(SlotRef::new(array, index, token.inc_dec)));
            },
            TokenKind::Func => {
                let name = token.text.to_lowercase();
                let Some(function) = ctx.functions.get(&name).cloned() else {
                    return Err(RuntimeError::UnknownFunction { name: token.text.clone() });
                };
                let result = function.call(&mut stack, ctx)?;
                stack.push(result);
            },
            TokenKind::Gate => {
                let top = stack.last().ok_or(RuntimeError::MissingOperand)?;
                let value = match top {
                    Value::Ref(slot) => slot.peek(),
                    other => other.clone(),
                };
                let Value::Bool(condition) = value else {
                    return Err(RuntimeError::ExpectedBoolean { what: format!("left operand of '{}'", token.text) });
                };
                let skip = if token.text == "&&" { !condition } else { condition };
                if skip {
                    skip_until = token.gate_id;
                }
            },
            TokenKind::Op => apply_operator(token, expr, env, &mut stack)?,
        }
    }

    if stack.len() != 1 {
        return Err(RuntimeError::StackImbalance);
    }
    Ok(pop(&mut stack)?.collapse())
}

fn apply_operator(token: &Token,
                  expr: &[Token],
                  env: &mut Env,
                  stack: &mut Vec<Value>)
                  -> EvalResult<()> {
    let op = token.text.as_str();

    if op == "!" {
        let value = pop(stack)?.collapse();
        let negated = match value {
            Value::Bool(b) => Value::Bool(!b),
            Value::Num(n) => Value::Num(n.not()?),
            _ => {
                return Err(RuntimeError::IllegalOperands { op: "!".to_string() });
            },
        };
        stack.push(negated);
        return Ok(());
    }

    let rhs_raw = pop(stack)?;
    // keep the slot reference so the assignment family can write back;
    // reading it consumes any pending ++/-- exactly once. The left operand
    // must be read before the right one so pre/post markers fire in
    // source order.
    let (slot, lhs) = match pop(stack)? {
        Value::Ref(reference) => {
            let value = reference.get();
            (Some(reference), value)
        },
        other => (None, other),
    };
    let rhs = rhs_raw.collapse();

    match op {
        "<" | "<=" | ">" | ">=" | "==" | "!=" => {
            stack.push(binary::compare(op, &lhs, &rhs)?);
        },
        "=" => {
            if let Some(slot) = slot {
                slot.set(rhs);
                stack.push(Value::Ref(slot));
            } else if let Some(name) = scalar_target(expr) {
                env.insert(name.to_string(), rhs.clone());
                stack.push(rhs);
            } else {
                return Err(RuntimeError::NotAssignable { op: op.to_string() });
            }
        },
        "+" | "+=" => {
            let value = binary::add(&lhs, &rhs)?;
            stack.push(value.clone());
            if op == "+=" {
                write_back(expr, env, slot.as_ref(), op, value)?;
            }
        },
        "-" | "*" | "/" | "%" => {
            stack.push(binary::arithmetic(op, &lhs, &rhs)?);
        },
        "-=" | "*=" | "/=" | "%=" => {
            let value = binary::arithmetic(op, &lhs, &rhs)?;
            stack.push(value.clone());
            write_back(expr, env, slot.as_ref(), op, value)?;
        },
        "<<" | ">>" | ">>>" => {
            stack.push(binary::shift(op, &lhs, &rhs)?);
        },
        "&" | "&&" | "|" | "||" | "^" => {
            stack.push(binary::logic(op, &lhs, &rhs)?);
        },
        _ => return Err(RuntimeError::UnknownOperator { op: op.to_string() }),
    }
    Ok(())
}

/// Reads a variable token, resolving the literal names `true`, `false`,
/// and `null` first, applying any fused `++`/`--` marker when the binding
/// holds a number, and reading missing bindings as `Null`.
fn read_variable(token: &Token, env: &mut Env) -> Value {
    match token.text.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {},
    }
    let current = env.get(&token.text).cloned();
    match (token.inc_dec, current) {
        (Some(step), Some(Value::Num(number))) => {
            let one = NumVal::one();
            let updated = if step.is_increment() {
                number.add(&one)
            } else {
                number.subtract(&one)
            };
            env.insert(token.text.clone(), Value::Num(updated.clone()));
            if step.is_pre() {
                Value::Num(updated)
            } else {
                Value::Num(number)
            }
        },
        (_, Some(value)) => value,
        (_, None) => Value::Null,
    }
}

/// Looks up (or lazily creates) the array bound to `name`.
fn array_binding(name: &str, env: &mut Env) -> EvalResult<SparseArray> {
    match env.get(name) {
        Some(Value::Array(array)) => Ok(array.clone()),
        Some(_) => Err(RuntimeError::NotAnArray { name: name.to_string() }),
        None => {
            let array = SparseArray::new();
            env.insert(name.to_string(), Value::Array(array.clone()));
            Ok(array)
        },
    }
}

/// The scalar assignment target: the variable token at position 1 of the
/// postfix vector (right after the expression tag). Only simple
/// `name = expr` shapes have one; anything richer must assign through an
/// array-slot reference.
fn scalar_target(expr: &[Token]) -> Option<&str> {
    match expr.get(1) {
        Some(token) if token.kind == TokenKind::Var => Some(token.text.as_str()),
        _ => None,
    }
}

fn write_back(expr: &[Token],
              env: &mut Env,
              slot: Option<&SlotRef>,
              op: &str,
              value: Value)
              -> EvalResult<()> {
    if let Some(slot) = slot {
        slot.set(value);
    } else if let Some(name) = scalar_target(expr) {
        env.insert(name.to_string(), value);
    } else {
        return Err(RuntimeError::NotAssignable { op: op.to_string() });
    }
    Ok(())
}
