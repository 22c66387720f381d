use rill::{evaluate, Env, ErrorKind, Function, Functions, NumVal, RuntimeError, Value};

fn num(text: &str) -> Value {
    Value::Num(NumVal::parse(text).unwrap())
}

fn eval_in(env: &mut Env, expr: &str) -> Value {
    match evaluate(expr, env, &Functions::new()) {
        Ok(value) => value,
        Err(e) => panic!("'{expr}' failed: {e}"),
    }
}

fn check(env: &mut Env, expr: &str, expected: &Value) {
    assert_eq!(&eval_in(env, expr), expected, "{expr}");
}

fn check_true(env: &mut Env, expr: &str) {
    check(env, expr, &Value::Bool(true));
}

fn check_false(env: &mut Env, expr: &str) {
    check(env, expr, &Value::Bool(false));
}

fn kind_of(expr: &str) -> ErrorKind {
    let mut env = Env::new();
    match evaluate(expr, &mut env, &Functions::new()) {
        Ok(value) => panic!("'{expr}' unexpectedly evaluated to {value}"),
        Err(e) => e.kind(),
    }
}

#[test]
fn mixed_integer_and_decimal_arithmetic() {
    let mut env = Env::new();
    env.insert("dec1".to_string(), num("1.2"));
    env.insert("int1".to_string(), num("3"));

    check(&mut env, "1 + 1", &num("2"));
    check(&mut env, "2.2 + 3.3", &num("5.5"));
    check(&mut env, "dec1 + dec1", &num("2.4"));
    check(&mut env, "dec1 + int1", &num("4.2"));
    check(&mut env, "int1 + int1", &num("6"));

    check(&mut env, "2 - 3", &num("-1"));
    check(&mut env, "2.2 - 3.3", &num("-1.1"));
    check(&mut env, "dec1 - dec1", &num("0"));
    check(&mut env, "dec1 - int1", &num("-1.8"));

    check(&mut env, "2 * 3", &num("6"));
    check(&mut env, "2.2 * 3.3", &num("7.26"));
    check(&mut env, "dec1 * dec1", &num("1.44"));
    check(&mut env, "dec1 * int1", &num("3.6"));

    check(&mut env, "4 / 2", &num("2"));
    check(&mut env, "6.6 / 3.3", &num("2"));
    check(&mut env, "dec1 / dec1", &num("1"));
    check(&mut env, "dec1 / int1", &num("0.4"));
}

#[test]
fn scale_invariant_decimal_comparison() {
    let mut env = Env::new();
    check_true(&mut env, "2.000 == 2.0");
    check_true(&mut env, "2.000 == 2");
    check_false(&mut env, "2 != 2.00");
}

#[test]
fn integer_division_truncates_toward_zero() {
    let mut env = Env::new();
    check(&mut env, "7 / 2", &num("3"));
    check(&mut env, "-7 / 2", &num("-3"));
}

#[test]
fn string_concatenation() {
    let mut env = Env::new();
    env.insert("I".to_string(), Value::from("X"));
    env.insert("Q".to_string(), Value::from("Y"));

    check_true(&mut env, "I + Q == 'XY'");
    check(&mut env, "I += Q", &Value::from("XY"));
    check_true(&mut env, "I == 'XY'");
    check(&mut env, "0xD8 + 0x01", &num("0xD9"));
    check_true(&mut env, "'X' + 'Y' == 'XY'");
    check_true(&mut env, "'X' + 10 == 'X10'");
    check_true(&mut env, "10 + 'X' == '10X'");
    check_true(&mut env, "Q + 10 == 'Y10'");
    check_true(&mut env, "10 + Q == '10Y'");
    check_true(&mut env, "'on: ' + true == 'on: true'");
}

#[test]
fn string_comparison_operators() {
    let mut env = Env::new();
    check_true(&mut env, "'XX' == 'XX'");
    check_true(&mut env, "'XX' != 'YY'");
    check_true(&mut env, "('XX' == 'XX') & true");
    check_true(&mut env, "'XX' < 'XY'");
    check_true(&mut env, "'XY' > 'XX'");
    check_true(&mut env, "'XX' <= 'XY'");
}

#[test]
fn precedence_and_grouping() {
    let mut env = Env::new();
    check_true(&mut env, "(((2) + (2)) > ((1 + 1)))");
    check(&mut env, "(2 + 2) * (1 + 1)", &num("8"));
    check(&mut env, "4 + -2", &num("2"));
    check(&mut env, "(2 * (3 + 3)) / 2", &num("6"));
    check(&mut env, "(1 ^ (1 | 2)) & 3", &num("2"));
    check(&mut env, "(1 ^ !3) & 3", &num("1"));
    check(&mut env, "5 % 2", &num("1"));
}

#[test]
fn shifts() {
    let mut env = Env::new();
    check(&mut env, "1 << 2", &num("4"));
    check(&mut env, "-1 << 2", &num("-4"));
    check(&mut env, "8 >> 2", &num("2"));
    check(&mut env, "-8 >> 2", &num("-2"));
    check(&mut env, "-8 >>> 2", &num("-2"));
    // >> truncates toward zero, >>> rounds toward negative infinity
    check(&mut env, "-9 >> 2", &num("-2"));
    check(&mut env, "-9 >>> 2", &num("-3"));
}

#[test]
fn assignment_operators() {
    let mut env = Env::new();
    check(&mut env, "ii = 2", &num("2"));
    check(&mut env, "ii += 5 - 2", &num("5"));
    check(&mut env, "ii -= 5 - 2", &num("2"));
    check(&mut env, "ii *= 5 - 2", &num("6"));
    check(&mut env, "ii /= 5 - 2", &num("2"));
    check(&mut env, "ii %= 5 - 2", &num("2"));
}

#[test]
fn pre_and_post_increment_on_scalars() {
    let mut env = Env::new();
    eval_in(&mut env, "ii = 5");
    eval_in(&mut env, "jj = 3");
    check(&mut env, "ii-- + jj--", &num("8"));
    check(&mut env, "ii + jj", &num("6"));
    check(&mut env, "++ii + ++jj", &num("8"));
    check(&mut env, "--ii + ii", &num("8"));
    check(&mut env, "++ii + ii", &num("10"));
    check(&mut env, "ii-- + ii", &num("9"));
}

#[test]
fn pre_and_post_increment_on_decimals() {
    let mut env = Env::new();
    eval_in(&mut env, "ii = 5.1");
    eval_in(&mut env, "jj = 3.2");
    check(&mut env, "ii-- + jj--", &num("8.3"));
    check(&mut env, "ii + jj", &num("6.3"));
    check(&mut env, "++ii + ++jj", &num("8.3"));
    check(&mut env, "--ii + ii", &num("8.2"));
    check(&mut env, "++ii + ii", &num("10.2"));
    check(&mut env, "ii-- + ii", &num("9.2"));
}

#[test]
fn pre_and_post_increment_on_array_slots() {
    let mut env = Env::new();
    eval_in(&mut env, "ii[0] = 5");
    eval_in(&mut env, "ii[1] = 3");
    check(&mut env, "ii[0]-- + ii[1]--", &num("8"));
    check(&mut env, "ii[0] + ii[1]", &num("6"));
    check(&mut env, "++ii[0] + ++ii[1]", &num("8"));
    check(&mut env, "--ii[0] + ii[0]", &num("8"));
    check(&mut env, "++ii[0] + ii[0]", &num("10"));
    check(&mut env, "ii[0]-- + ii[0]", &num("9"));
}

#[test]
fn short_circuit_and_elides_side_effects() {
    let mut env = Env::new();
    eval_in(&mut env, "ii = 5");
    check_true(&mut env, "ii == 5 && ++ii == 6");
    check_true(&mut env, "ii == 6");
    check_false(&mut env, "ii == 5 && ++ii == 6");
    check_true(&mut env, "ii == 6");
}

#[test]
fn short_circuit_or_elides_side_effects() {
    let mut env = Env::new();
    eval_in(&mut env, "ii = 5");
    check_true(&mut env, "ii == 5 || ++ii == 6");
    check_true(&mut env, "ii == 5");
    check_true(&mut env, "ii == 4 || ++ii == 6");
    check_true(&mut env, "ii == 6");
}

#[test]
fn null_comparisons() {
    let mut env = Env::new();
    env.insert("V2".to_string(), Value::from("2"));
    env.insert("V3".to_string(), Value::Null);

    check_false(&mut env, "QQ == '1'");
    check_true(&mut env, "QQ != '1'");
    check_false(&mut env, "V3 != null && V3 == 'TEST'");
    check_true(&mut env, "V3 == null || V3 == 'TEST'");
    check_false(&mut env, "V2 == null || V2 == 'TEST'");
    check_true(&mut env, "null == null");
}

#[test]
fn numeric_comparisons_and_boolean_logic() {
    let mut env = Env::new();
    check_true(&mut env, "11 < 12");
    check_false(&mut env, "11 < 11");
    check_true(&mut env, "12 > 10");
    check_true(&mut env, "12 <= 12");
    check_false(&mut env, "13 <= 12");
    check_true(&mut env, "12 >= 12");
    check_false(&mut env, "12 >= 13");
    check_true(&mut env, "10 == 10");
    check_false(&mut env, "10 == 11");
    check_true(&mut env, "10 != 11");
    check_true(&mut env, "-2 < -1");
    check_true(&mut env, "true & true");
    check_false(&mut env, "true & false");
    check_true(&mut env, "true | false");
    check_true(&mut env, "!true ^ !false");
}

#[test]
fn array_reads_writes_and_compound_assignment() {
    let mut env = Env::new();
    eval_in(&mut env, "v = 5");
    eval_in(&mut env, "c = a[0]");
    check_true(&mut env, "c == null");
    eval_in(&mut env, "a[0] = 5");
    eval_in(&mut env, "c = a[0]");
    check_true(&mut env, "c == 5");
    eval_in(&mut env, "a[1] = 2");
    eval_in(&mut env, "a[2] = 3");
    check(&mut env, "a[1]", &num("2"));
    check(&mut env, "a[2]", &num("3"));
    check_false(&mut env, "a[1] == a[2]");
    eval_in(&mut env, "a[2] += 1");
    check_true(&mut env, "a[2] == 4");
    check_true(&mut env, "4 == a[2]");
    check(&mut env, "a[1] += 1", &num("3"));
    check(&mut env, "a[1] -= 1", &num("2"));
    check(&mut env, "a[1] /= 2", &num("1"));
    check(&mut env, "a[1] *= 4", &num("4"));
}

#[test]
fn arrays_index_with_expressions() {
    let mut env = Env::new();
    eval_in(&mut env, "ii = 1");
    eval_in(&mut env, "a[ii] = 5");
    // the slot, not the index variable, receives the value
    check(&mut env, "ii", &num("1"));
    check(&mut env, "a[1]", &num("5"));
    check(&mut env, "a[ii + 1] = 7", &num("7"));
    check(&mut env, "a[2]", &num("7"));
}

#[test]
fn string_arrays_and_concatenation() {
    let mut env = Env::new();
    eval_in(&mut env, "s[0] = 'XX'");
    eval_in(&mut env, "s[1] = 'ABC'");
    eval_in(&mut env, "t[0] = 123");
    check(&mut env, "s[0] += 'YY'", &Value::from("XXYY"));
    check(&mut env, "s[0] + 'YY'", &Value::from("XXYYYY"));
    check(&mut env, "s[0] + s[1]", &Value::from("XXYYABC"));
    check(&mut env, "++t[0] + ' ms'", &Value::from("124 ms"));
}

#[test]
fn builtin_min_max_abs_pow() {
    let mut env = Env::new();
    eval_in(&mut env, "A = 10");
    eval_in(&mut env, "B = 20");
    check(&mut env, "max((A),(B))", &num("20"));
    check(&mut env, "min(A,B)", &num("10"));
    check(&mut env, "max(10, 9.9)", &num("10"));
    check(&mut env, "max(9.9, 10)", &num("10"));
    check(&mut env, "min(10, 9.9)", &num("9.9"));
    check(&mut env, "min(9.9, 10)", &num("9.9"));
    check(&mut env, "abs(-2)", &num("2"));

    let decimal = eval_in(&mut env, "pow(3.0, 2)");
    assert_eq!(decimal, num("9.0"));
    assert!(matches!(decimal, Value::Num(NumVal::Dec(_))));

    let integer = eval_in(&mut env, "pow(3, 2)");
    assert_eq!(integer, num("9"));
    assert!(matches!(integer, Value::Num(NumVal::Int(_))));
}

#[test]
fn builtin_trunc() {
    let mut env = Env::new();
    check(&mut env, "trunc(1.0 / 3, 2)", &num("0.33"));

    let truncated = eval_in(&mut env, "trunc(1.22, 0)");
    assert_eq!(truncated, num("1"));
    assert!(matches!(truncated, Value::Num(NumVal::Int(_))));
}

#[test]
fn builtin_bit_functions() {
    let mut env = Env::new();
    eval_in(&mut env, "A = 0");
    eval_in(&mut env, "B = 0");
    check_true(&mut env, "bit(0x80, 7)");
    check_false(&mut env, "bit(0x80, 6)");
    check(&mut env, "set(0, 2)", &num("4"));
    check(&mut env, "clr(7, 1)", &num("5"));
    check(&mut env, "A = flip(A, 1)", &num("2"));
    check(&mut env, "B = set(B, 2)", &num("4"));
    check_true(&mut env, "A == 2 && B == 4");
    // negative integers behave as infinitely sign-extended
    check_true(&mut env, "bit(-1, 200)");
}

#[test]
fn builtin_radix() {
    let mut env = Env::new();
    check(&mut env, "radix(255, 16)", &Value::from("FF"));
    check(&mut env, "radix(5, 2)", &Value::from("101"));
}

#[test]
fn builtin_millis_is_an_integer() {
    let mut env = Env::new();
    let value = eval_in(&mut env, "millis()");
    assert!(matches!(value, Value::Num(NumVal::Int(ref v)) if v > &num_bigint_zero()));

    fn num_bigint_zero() -> num_bigint::BigInt {
        num_bigint::BigInt::from(0)
    }
}

#[test]
fn arbitrary_precision_cube_identity() {
    let mut env = Env::new();
    eval_in(&mut env, "a = 569936821221962380720");
    eval_in(&mut env, "b = -569936821113563493509");
    eval_in(&mut env, "c = -472715493453327032");
    check(&mut env, "a*a*a + b*b*b + c*c*c", &num("3"));
}

#[test]
fn external_host_function() {
    let mut functions = Functions::new();
    functions.insert("reverse".to_string(),
                     Function::host(|stack: &mut Vec<Value>| {
                         match rill::pop_value(stack)? {
                             Value::Str(text) => {
                                 Ok(Some(Value::Str(text.chars().rev().collect())))
                             },
                             _ => {
                                 Err(RuntimeError::InvalidArgument { details: "reverse() needs a string".to_string() })
                             },
                         }
                     }));
    let mut env = Env::new();
    let value = evaluate("reverse('XYZ') == 'ZYX'", &mut env, &functions).unwrap();
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn error_kinds() {
    assert_eq!(kind_of("(1 + 2"), ErrorKind::Syntax);
    assert_eq!(kind_of("1 + 2)"), ErrorKind::Syntax);
    assert_eq!(kind_of("a[1"), ErrorKind::Syntax);
    assert_eq!(kind_of("1 + [2]"), ErrorKind::Syntax);
    assert_eq!(kind_of("$"), ErrorKind::Syntax);
    assert_eq!(kind_of("5 = 3"), ErrorKind::Syntax);
    assert_eq!(kind_of("1 / 0"), ErrorKind::Type);
    assert_eq!(kind_of("'a' < 1"), ErrorKind::Type);
    assert_eq!(kind_of("x < null"), ErrorKind::Type);
    assert_eq!(kind_of("true == true"), ErrorKind::Type);
    assert_eq!(kind_of("a[1.5] = 2"), ErrorKind::Type);
    assert_eq!(kind_of("1.5 & 2"), ErrorKind::TypeMismatch);
    assert_eq!(kind_of("1.5 % 2"), ErrorKind::TypeMismatch);
    assert_eq!(kind_of("pow(2, 1.5)"), ErrorKind::TypeMismatch);
    assert_eq!(kind_of("trunc(2, 0)"), ErrorKind::TypeMismatch);
    assert_eq!(kind_of("nope(1)"), ErrorKind::Name);
    assert_eq!(kind_of("1 2"), ErrorKind::Internal);
}

#[test]
fn stopped_is_not_wrapped_by_expression_context() {
    // the cancellation signal keeps its kind through nested evaluation
    assert!(RuntimeError::Stopped.in_expression("x + 1").is_stopped());
}

#[test]
fn errors_name_the_offending_expression() {
    let mut env = Env::new();
    let error = evaluate("1 +", &mut env, &Functions::new()).unwrap_err();
    assert!(error.to_string().contains("1 +"), "{error}");

    let error = evaluate("nope(1)", &mut env, &Functions::new()).unwrap_err();
    assert!(error.to_string().contains("nope(1)"), "{error}");
}
