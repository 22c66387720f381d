use std::{cell::RefCell, rc::Rc};

use rill::{run, Env, ErrorKind, Function, Functions, NumVal, Script, Stopped, Value};

fn num(text: &str) -> Value {
    Value::Num(NumVal::parse(text).unwrap())
}

/// Builds `print`/`println` host functions that append to a shared buffer.
fn capture_output() -> (Functions, Rc<RefCell<String>>) {
    let buffer = Rc::new(RefCell::new(String::new()));
    let mut functions = Functions::new();

    let sink = Rc::clone(&buffer);
    functions.insert("print".to_string(),
                     Function::host(move |stack: &mut Vec<Value>| {
                         let value = rill::pop_value(stack)?;
                         sink.borrow_mut().push_str(&value.to_string());
                         Ok(None)
                     }));

    let sink = Rc::clone(&buffer);
    functions.insert("println".to_string(),
                     Function::host(move |stack: &mut Vec<Value>| {
                         let value = rill::pop_value(stack)?;
                         let mut out = sink.borrow_mut();
                         out.push_str(&value.to_string());
                         out.push('\n');
                         Ok(None)
                     }));

    (functions, buffer)
}

fn run_for_output(source: &str) -> String {
    let (functions, output) = capture_output();
    let script = Script::new(source, functions);
    if let Err(e) = script.run() {
        panic!("script failed: {e}");
    }
    let result = output.borrow().clone();
    result
}

#[test]
fn while_loop_counts_to_three() {
    let source = "\
ii = 0
while (ii < 3)
  ii = ii + 1
return ii";
    assert_eq!(run(source).unwrap(), num("3"));
}

#[test]
fn while_loop_observer_sees_revisited_lines() {
    let source = "\
ii = 0
while (ii < 3)
  ii = ii + 1";
    let script = Script::new(source, Functions::new());

    let mut lines = Vec::new();
    let mut final_count = None;
    let mut observer = |number: usize, vars: &Env| -> Result<(), Stopped> {
        lines.push(number);
        if number == 0 {
            final_count = vars.get("ii").cloned();
        }
        Ok(())
    };
    script.run_observed(&mut observer).unwrap();

    assert_eq!(lines, [1, 2, 3, 3, 3, 0]);
    assert_eq!(final_count, Some(num("3")));
}

#[test]
fn for_loop_prints_digits() {
    let source = "\
for (ii = 0; ii < 10; ii++)
  println(ii)";
    assert_eq!(run_for_output(source), "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n");
}

#[test]
fn user_function_call() {
    let source = "\
function sum(a, b)
  return a + b
println(sum(2, 3))";
    assert_eq!(run_for_output(source), "5\n");
}

#[test]
fn user_function_observer_sees_call_site_then_body() {
    let source = "\
function f(a)
  x = a
f(1)";
    let script = Script::new(source, Functions::new());

    let mut lines = Vec::new();
    let mut observer = |number: usize, _vars: &Env| -> Result<(), Stopped> {
        lines.push(number);
        Ok(())
    };
    script.run_observed(&mut observer).unwrap();

    assert_eq!(lines, [1, 3, 2, 0]);
}

#[test]
fn function_names_are_case_insensitive() {
    let source = "\
function Add(a, b)
  return a + b
return ADD(1, 2)";
    assert_eq!(run(source).unwrap(), num("3"));
}

#[test]
fn recursive_function_with_return_from_nested_block() {
    let source = "\
function fib(n)
  if n < 2
    return n
  return fib(n - 1) + fib(n - 2)
println(fib(10))";
    assert_eq!(run_for_output(source), "55\n");
}

#[test]
fn functions_see_only_their_arguments() {
    let source = "\
secret = 41
function peek(a)
  return secret
return peek(1) == null";
    assert_eq!(run(source).unwrap(), Value::Bool(true));
}

#[test]
fn if_elif_else_chain() {
    let source = "\
x = 2
y = ''
if x == 1
  y = 'one'
elif x == 2
  y = 'two'
else
  y = 'many'
return y";
    assert_eq!(run(source).unwrap(), Value::from("two"));
}

#[test]
fn else_runs_when_nothing_was_taken() {
    let source = "\
x = 9
y = ''
if x == 1
  y = 'one'
elif x == 2
  y = 'two'
else
  y = 'many'
return y";
    assert_eq!(run(source).unwrap(), Value::from("many"));
}

#[test]
fn block_assignments_propagate_to_existing_names_only() {
    let source = "\
x = 1
if true
  x = 2
  y = 9
return x";
    assert_eq!(run(source).unwrap(), num("2"));

    let source = "\
x = 1
if true
  y = 9
return y";
    assert_eq!(run(source).unwrap(), Value::Null);
}

#[test]
fn arrays_mutate_through_blocks() {
    let source = "\
a[0] = 0
ii = 0
while (ii < 4)
  a[ii] = ii * ii
  ii = ii + 1
return a[3]";
    assert_eq!(run(source).unwrap(), num("9"));
}

#[test]
fn nested_loops() {
    let source = "\
total = 0
for (ii = 0; ii < 3; ii++)
  for (jj = 0; jj < 3; jj++)
    total = total + 1
return total";
    assert_eq!(run(source).unwrap(), num("9"));
}

#[test]
fn end_is_a_no_op() {
    let source = "\
ii = 0
while (ii < 2)
  ii = ii + 1
end
return ii";
    assert_eq!(run(source).unwrap(), num("2"));
}

#[test]
fn comments_and_double_quotes_are_normalised() {
    let source = "\
// a comment on its own line
x = \"abc\" // trailing comment
return x + 'def'";
    assert_eq!(run(source).unwrap(), Value::from("abcdef"));
}

#[test]
fn blank_lines_keep_line_numbers_aligned() {
    let source = "\
x = 1

x = 2";
    let script = Script::new(source, Functions::new());
    let mut lines = Vec::new();
    let mut observer = |number: usize, _vars: &Env| -> Result<(), Stopped> {
        lines.push(number);
        Ok(())
    };
    script.run_observed(&mut observer).unwrap();
    assert_eq!(lines, [1, 3, 0]);
}

#[test]
fn inconsistent_dedent_is_tolerated() {
    let source = "\
ii = 0
if true
    ii = 1
  jj = 2
return jj";
    assert_eq!(run(source).unwrap(), num("2"));
}

#[test]
fn observer_cancellation_stops_the_run() {
    let source = "\
a1 = 1
a2 = 2
a3 = 3
a4 = 4
a5 = 5
a6 = 6
a7 = 7
a8 = 8
a9 = 9
a10 = 10";
    let script = Script::new(source, Functions::new());

    let mut seen = Vec::new();
    let mut observer = |number: usize, _vars: &Env| -> Result<(), Stopped> {
        seen.push(number);
        if number == 2 {
            return Err(Stopped);
        }
        Ok(())
    };
    let error = script.run_observed(&mut observer).unwrap_err();

    assert!(error.is_stopped());
    assert_eq!(error.kind(), ErrorKind::Stopped);
    assert_eq!(seen, [1, 2]);
}

#[test]
fn cancellation_propagates_out_of_function_frames() {
    let source = "\
function spin(n)
  while (n > 0)
    n = n - 1
  return 0
spin(100)";
    let script = Script::new(source, Functions::new());

    let mut calls = 0usize;
    let mut observer = move |_number: usize, _vars: &Env| -> Result<(), Stopped> {
        calls += 1;
        if calls > 20 {
            return Err(Stopped);
        }
        Ok(())
    };
    let error = script.run_observed(&mut observer).unwrap_err();
    assert!(error.is_stopped());
}

#[test]
fn mutations_before_cancellation_are_kept() {
    let source = "\
ii = 1
ii = 2
ii = 3";
    let script = Script::new(source, Functions::new());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&seen);
    let mut observer = move |number: usize, vars: &Env| -> Result<(), Stopped> {
        record.borrow_mut().push(vars.get("ii").cloned());
        if number == 3 {
            return Err(Stopped);
        }
        Ok(())
    };
    let error = script.run_observed(&mut observer).unwrap_err();
    assert!(error.is_stopped());
    // at line 3 the previous assignment has already landed
    assert_eq!(seen.borrow().last().cloned().flatten(), Some(num("2")));
}

#[test]
fn keyword_prefixes_do_not_hijack_statements() {
    let source = "\
form = 1
iffy = 2
ended = 3
return form + iffy + ended";
    assert_eq!(run(source).unwrap(), num("6"));
}

#[test]
fn statement_shape_errors() {
    assert_eq!(run("if true").unwrap_err().kind(), ErrorKind::Syntax);
    assert_eq!(run("else\n  x = 1").unwrap_err().kind(), ErrorKind::Syntax);
    assert_eq!(run("for (ii = 0; ii < 1)\n  x = 1").unwrap_err().kind(),
               ErrorKind::Syntax);
    assert_eq!(run("function\n  x = 1").unwrap_err().kind(), ErrorKind::Syntax);
    assert_eq!(run("function f(1)\n  x = 1").unwrap_err().kind(),
               ErrorKind::Syntax);
}

#[test]
fn condition_type_errors() {
    assert_eq!(run("if 1\n  x = 1").unwrap_err().kind(), ErrorKind::Type);
    assert_eq!(run("while 'yes'\n  x = 1").unwrap_err().kind(), ErrorKind::Type);
}

#[test]
fn compound_assignment_to_unset_slot_is_a_type_error() {
    let error = run("a[1] += 1").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Type);
}

#[test]
fn top_level_return_is_the_script_result() {
    assert_eq!(run("return 1 + 1").unwrap(), num("2"));
    assert_eq!(run("return").unwrap(), Value::Null);
    assert_eq!(run("x = 1").unwrap(), Value::Null);
}

#[test]
fn mixed_precision_end_to_end() {
    let source = "\
third = 1.0 / 3
if trunc(third, 2) == 0.33
  ok = 1
return trunc(third, 6)";
    assert_eq!(run(source).unwrap(), num("0.333333"));
}
