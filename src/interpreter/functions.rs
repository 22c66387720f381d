use std::{cmp::Ordering, collections::HashMap, rc::Rc,
          time::{SystemTime, UNIX_EPOCH}};

use bigdecimal::RoundingMode;
use num_bigint::BigInt;

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, Env, EvalResult, Flow},
        script::Node,
        value::{core::Value, num::NumVal},
    },
    util::num::{bigint_to_i64_checked, bigint_to_u32_checked, bigint_to_u64_checked},
};

/// The function registry: lowercased name to callable.
pub type Functions = HashMap<String, Function>;

/// A host-provided callable.
///
/// A host function consumes the values it needs from the top of the value
/// stack (rightmost argument on top) and returns at most one result;
/// `None` becomes `Null`. The trait is implemented for any matching
/// closure, so most hosts never name it:
///
/// ```
/// use rill::{Function, Value, pop_value};
///
/// let double = Function::host(|stack: &mut Vec<Value>| {
///     let n = pop_value(stack)?;
///     Ok(Some(rill::interpreter::evaluator::binary::add(&n, &n)?))
/// });
/// ```
pub trait HostFunction {
    /// Pops this function's arguments from `stack` and produces a result.
    ///
    /// # Errors
    /// Any [`RuntimeError`] the function wants to surface; argument type
    /// failures conventionally use `TypeMismatch` or `InvalidArgument`.
    fn call(&self, stack: &mut Vec<Value>) -> EvalResult<Option<Value>>;
}

impl<F> HostFunction for F where F: Fn(&mut Vec<Value>) -> EvalResult<Option<Value>>
{
    fn call(&self, stack: &mut Vec<Value>) -> EvalResult<Option<Value>> {
        self(stack)
    }
}

/// A function declared by the script: a captured statement subtree and the
/// parameter names to bind.
#[derive(Debug, Clone)]
pub struct UserFunction {
    params: Vec<String>,
    body:   Vec<Node>,
}

impl UserFunction {
    /// Pops one argument per parameter (top of stack first, bound to the
    /// parameters in declaration order), evaluates the body in a fresh
    /// environment holding only those bindings, and returns the `return`
    /// value, `Null` if the body never returned.
    pub(crate) fn call(&self, stack: &mut Vec<Value>, ctx: &mut Context) -> EvalResult<Value> {
        let mut frame = Env::new();
        for name in &self.params {
            frame.insert(name.clone(), pop_value(stack)?);
        }
        match ctx.eval_nodes(&self.body, &mut frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }
}

/// An entry in the function registry.
#[derive(Clone)]
pub enum Function {
    /// A capability supplied by the host (or one of the built-ins).
    Host(Rc<dyn HostFunction>),
    /// A function declared in the script.
    User(Rc<UserFunction>),
}

impl Function {
    /// Wraps a host closure. Hosts with stateful implementors of
    /// [`HostFunction`] can construct the [`Host`](Self::Host) variant
    /// directly.
    pub fn host<F>(function: F) -> Self
        where F: Fn(&mut Vec<Value>) -> EvalResult<Option<Value>> + 'static
    {
        Self::Host(Rc::new(function))
    }

    pub(crate) fn user(params: Vec<String>, body: Vec<Node>) -> Self {
        Self::User(Rc::new(UserFunction { params, body }))
    }

    pub(crate) fn call(&self, stack: &mut Vec<Value>, ctx: &mut Context) -> EvalResult<Value> {
        match self {
            Self::Host(function) => Ok(function.call(stack)?.unwrap_or(Value::Null)),
            Self::User(function) => function.call(stack, ctx),
        }
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(_) => write!(f, "Function::Host"),
            Self::User(function) => write!(f, "Function::User({} params)", function.params.len()),
        }
    }
}

/// Pops the top of the value stack.
///
/// # Errors
/// `MissingOperand` if the stack is empty.
pub(crate) fn pop(stack: &mut Vec<Value>) -> EvalResult<Value> {
    stack.pop().ok_or(RuntimeError::MissingOperand)
}

/// Pops the top of the value stack, collapsing an array-slot reference to
/// the value it refers to. This is how host functions read arguments.
///
/// # Errors
/// `MissingOperand` if the stack is empty.
pub fn pop_value(stack: &mut Vec<Value>) -> EvalResult<Value> {
    Ok(pop(stack)?.collapse())
}

/// Pops a numeric argument for the function named `func`.
///
/// # Errors
/// `MissingOperand` on an empty stack, `ExpectedNumber` otherwise.
pub fn pop_num(stack: &mut Vec<Value>, func: &str) -> EvalResult<NumVal> {
    match pop_value(stack)? {
        Value::Num(number) => Ok(number),
        _ => Err(RuntimeError::ExpectedNumber { op: func.to_string() }),
    }
}

/// Pops an integer argument for the function named `func`.
///
/// # Errors
/// `MissingOperand` on an empty stack, `TypeMismatch` otherwise.
pub fn pop_int(stack: &mut Vec<Value>, func: &str) -> EvalResult<BigInt> {
    match pop_value(stack)? {
        Value::Num(NumVal::Int(value)) => Ok(value),
        _ => Err(RuntimeError::TypeMismatch { op: func.to_string() }),
    }
}

/// Builds the registry of built-in functions.
///
/// `max`, `min`, `abs`, and `pow` are numeric with the usual promotion.
/// `trunc(v, n)` takes a decimal and a digit count: zero truncates to an
/// integer, positive rounds half-up to that many places. `radix(v, r)`
/// renders an integer in base `r` using uppercase digits. `bit`, `set`,
/// `clr`, and `flip` test and rewrite single bits with two's-complement
/// semantics. `millis()` is the wall clock in milliseconds.
#[must_use]
pub fn builtins() -> Functions {
    let mut map = Functions::new();
    map.insert("max".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let r = pop_num(stack, "max")?;
                   let l = pop_num(stack, "max")?;
                   Ok(Some(Value::Num(l.max(&r))))
               }));
    map.insert("min".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let r = pop_num(stack, "min")?;
                   let l = pop_num(stack, "min")?;
                   Ok(Some(Value::Num(l.min(&r))))
               }));
    map.insert("abs".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let v = pop_num(stack, "abs")?;
                   Ok(Some(Value::Num(v.abs())))
               }));
    map.insert("pow".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let exponent = pop_num(stack, "pow")?;
                   let base = pop_num(stack, "pow")?;
                   Ok(Some(Value::Num(base.pow(&exponent)?)))
               }));
    map.insert("trunc".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let places = pop_num(stack, "trunc")?;
                   let value = pop_num(stack, "trunc")?;
                   let (NumVal::Int(places), NumVal::Dec(value)) = (places, value) else {
                       return Err(RuntimeError::TypeMismatch { op: "trunc".to_string() });
                   };
                   let places = bigint_to_i64_checked(&places, "digit count")?;
                   match places.cmp(&0) {
                       Ordering::Equal => {
                           let (int, _) = value.with_scale_round(0, RoundingMode::Down)
                                               .into_bigint_and_exponent();
                           Ok(Some(Value::Num(NumVal::Int(int))))
                       },
                       Ordering::Greater => {
                           let rounded = value.with_scale_round(places, RoundingMode::HalfUp);
                           Ok(Some(Value::Num(NumVal::Dec(rounded))))
                       },
                       Ordering::Less => {
                           Err(RuntimeError::InvalidArgument { details: format!("trunc() digit count must not be negative, got {places}") })
                       },
                   }
               }));
    map.insert("radix".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let r = pop_int(stack, "radix")?;
                   let v = pop_int(stack, "radix")?;
                   let radix = bigint_to_u32_checked(&r, "radix")?;
                   if !(2..=36).contains(&radix) {
                       return Err(RuntimeError::InvalidArgument { details: format!("radix must be between 2 and 36, got {radix}") });
                   }
                   Ok(Some(Value::Str(v.to_str_radix(radix).to_uppercase())))
               }));
    map.insert("bit".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let (value, bit) = bit_args(stack, "bit")?;
                   Ok(Some(Value::Bool(value.bit(bit))))
               }));
    map.insert("set".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let (mut value, bit) = bit_args(stack, "set")?;
                   value.set_bit(bit, true);
                   Ok(Some(Value::Num(NumVal::Int(value))))
               }));
    map.insert("clr".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let (mut value, bit) = bit_args(stack, "clr")?;
                   value.set_bit(bit, false);
                   Ok(Some(Value::Num(NumVal::Int(value))))
               }));
    map.insert("flip".to_string(), Function::host(|stack: &mut Vec<Value>| {
                   let (mut value, bit) = bit_args(stack, "flip")?;
                   let current = value.bit(bit);
                   value.set_bit(bit, !current);
                   Ok(Some(Value::Num(NumVal::Int(value))))
               }));
    map.insert("millis".to_string(), Function::host(|_stack: &mut Vec<Value>| {
                   let now = SystemTime::now().duration_since(UNIX_EPOCH)
                                              .map_err(|_| RuntimeError::Internal { details: "system clock is before the epoch".to_string() })?;
                   Ok(Some(Value::Num(NumVal::Int(BigInt::from(now.as_millis())))))
               }));
    map
}

fn bit_args(stack: &mut Vec<Value>, func: &str) -> EvalResult<(BigInt, u64)> {
    let bit = pop_int(stack, func)?;
    let value = pop_int(stack, func)?;
    let bit = bigint_to_u64_checked(&bit, "bit position")?;
    Ok((value, bit))
}
