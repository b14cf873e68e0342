//! End-to-end JIT scenarios: each program is compiled to IR and executed,
//! and the `main` result is checked.

use void_compiler::jit_main;

fn jit_eval(source: &str) -> i32 {
    jit_main(source).expect("program should compile and run")
}

// ── Returns and arithmetic ───────────────────────────────────────────────

#[test]
fn constant_return() {
    assert_eq!(jit_eval("const main = fn() -> i32 { return 42 }"), 42);
}

#[test]
fn operator_precedence_in_arithmetic() {
    // 10 + 5 * 3 - 10 / 5 = 23
    let source = r#"
const main = fn() -> i32 {
  return 10 + 5 * 3 - 10 / 5
}
"#;
    assert_eq!(jit_eval(source), 23);
}

#[test]
fn unary_minus() {
    assert_eq!(jit_eval("const main = fn() -> i32 { return -(1 - 43) }"), 42);
}

// ── Variables ────────────────────────────────────────────────────────────

#[test]
fn declaration_and_mutation() {
    let source = r#"
const main = fn() -> i32 {
  x: i32 = 100
  x = x * 2
  return x
}
"#;
    assert_eq!(jit_eval(source), 200);
}

#[test]
fn inferred_declaration() {
    let source = r#"
const main = fn() -> i32 {
  x := 20
  y := x + 1
  return x + y
}
"#;
    assert_eq!(jit_eval(source), 41);
}

#[test]
fn parameter_mutation() {
    let source = r#"
const bump = fn(x: i32) -> i32 {
  x = x + 1
  return x
}
const main = fn() -> i32 { return bump(9) }
"#;
    assert_eq!(jit_eval(source), 10);
}

#[test]
fn sized_integer_round_trip() {
    let source = r#"
const main = fn() -> i32 {
  x: i64 = 40
  y: i64 = 2
  z: i64 = x + y
  return z
}
"#;
    assert_eq!(jit_eval(source), 42);
}

// ── Unsigned integers ────────────────────────────────────────────────────

#[test]
fn unsigned_widening_zero_extends() {
    // 200 fits in u8 only unsigned; sign extension would smuggle in -56.
    let source = r#"
const main = fn() -> i32 {
  a: u8 = 200
  b: u64 = 1000
  c: u64 = a + b
  return c
}
"#;
    assert_eq!(jit_eval(source), 1200);
}

#[test]
fn unsigned_argument_zero_extends_at_direct_calls() {
    let source = r#"
const widen = fn(x: u64) -> i32 {
  return x - 100
}
const main = fn() -> i32 {
  a: u8 = 200
  return widen(a)
}
"#;
    assert_eq!(jit_eval(source), 100);
}

#[test]
fn unsigned_argument_zero_extends_at_indirect_calls() {
    let source = r#"
const widen = fn(x: u64) -> i32 {
  return x - 100
}
const main = fn() -> i32 {
  op: fn(u64) -> i32 = widen
  a: u8 = 200
  return op(a)
}
"#;
    assert_eq!(jit_eval(source), 100);
}

// ── Control flow ─────────────────────────────────────────────────────────

#[test]
fn if_else_takes_the_right_branch() {
    let source = r#"
const test = fn(x: i32) -> i32 {
  if x > 10 { return 1 } else { return 2 }
}
const main = fn() -> i32 { return test(5) }
"#;
    assert_eq!(jit_eval(source), 2);
}

#[test]
fn else_if_chain() {
    let source = r#"
const classify = fn(x: i32) -> i32 {
  if x > 100 { return 3 } else if x > 10 { return 2 } else { return 1 }
}
const main = fn() -> i32 {
  return classify(500) * 100 + classify(50) * 10 + classify(5)
}
"#;
    assert_eq!(jit_eval(source), 321);
}

#[test]
fn range_loop_sums_half_open() {
    // 0+1+2+3+4 = 10
    let source = r#"
const main = fn() -> i32 {
  sum := 0
  loop i in 0..5 { sum = sum + i }
  return sum
}
"#;
    assert_eq!(jit_eval(source), 10);
}

#[test]
fn empty_range_never_runs() {
    let source = r#"
const main = fn() -> i32 {
  sum := 0
  loop i in 5..5 do sum = sum + 1
  loop i in 7..3 do sum = sum + 1
  return sum
}
"#;
    assert_eq!(jit_eval(source), 0);
}

#[test]
fn conditional_loop_runs_until_false() {
    let source = r#"
const main = fn() -> i32 {
  x := 10
  steps := 0
  loop if x > 0 {
    x = x - 2
    steps = steps + 1
  }
  return steps
}
"#;
    assert_eq!(jit_eval(source), 5);
}

#[test]
fn nested_range_loops() {
    // sum of i*j for i,j in 0..4 = (0+1+2+3)^2 = 36
    let source = r#"
const main = fn() -> i32 {
  sum := 0
  loop i in 0..4 {
    loop j in 0..4 {
      sum = sum + i * j
    }
  }
  return sum
}
"#;
    assert_eq!(jit_eval(source), 36);
}

#[test]
fn do_bodies_behave_like_blocks() {
    let source = r#"
const main = fn() -> i32 {
  sum := 0
  loop i in 0..10 do sum = sum + i
  if sum > 40 do return sum
  return 0
}
"#;
    assert_eq!(jit_eval(source), 45);
}

// ── Logic ────────────────────────────────────────────────────────────────

#[test]
fn and_or_not_combinations() {
    let source = r#"
const main = fn() -> i32 {
  a := true
  b := false
  if b and a do return 1
  if not (a or b) do return 2
  if a and not b do return 3
  return 0
}
"#;
    assert_eq!(jit_eval(source), 3);
}

#[test]
fn comparison_chain_with_logic() {
    let source = r#"
const in_range = fn(x: i32) -> bool {
  return x >= 10 and x <= 20
}
const main = fn() -> i32 {
  if in_range(15) do return 1
  return 0
}
"#;
    assert_eq!(jit_eval(source), 1);
}

// ── Functions ────────────────────────────────────────────────────────────

#[test]
fn direct_call_with_arguments() {
    let source = r#"
const add = fn(x: i32, y: i32) -> i32 { return x + y }
const main = fn() -> i32 { return add(5, 3) }
"#;
    assert_eq!(jit_eval(source), 8);
}

#[test]
fn recursion() {
    let source = r#"
const fact = fn(n: i32) -> i32 {
  if n > 1 do return n * fact(n - 1)
  return 1
}
const main = fn() -> i32 { return fact(5) }
"#;
    assert_eq!(jit_eval(source), 120);
}

#[test]
fn nil_function_call_as_statement() {
    let source = r#"
const nothing = fn() { return }
const main = fn() -> i32 {
  nothing()
  return 7
}
"#;
    assert_eq!(jit_eval(source), 7);
}

// ── Function pointers ────────────────────────────────────────────────────

#[test]
fn anonymous_function_through_pointer() {
    let source = r#"
const main = fn() -> i32 {
  op: fn(i32, i32) -> i32 = fn(a: i32, b: i32) -> i32 do return a + b
  return op(4, 6)
}
"#;
    assert_eq!(jit_eval(source), 10);
}

#[test]
fn named_function_through_pointer() {
    let source = r#"
const mul = fn(a: i32, b: i32) -> i32 { return a * b }
const main = fn() -> i32 {
  op: fn(i32, i32) -> i32 = mul
  return op(6, 7)
}
"#;
    assert_eq!(jit_eval(source), 42);
}

#[test]
fn function_pointer_reassignment() {
    let source = r#"
const inc = fn(x: i32) -> i32 { return x + 1 }
const dec = fn(x: i32) -> i32 { return x - 1 }
const main = fn() -> i32 {
  op: fn(i32) -> i32 = inc
  a := op(10)
  op = dec
  b := op(10)
  return a * 100 + b
}
"#;
    assert_eq!(jit_eval(source), 1109);
}

// ── Pointers ─────────────────────────────────────────────────────────────

#[test]
fn address_of_and_dereference() {
    let source = r#"
const main = fn() -> i32 {
  x: i32 = 5
  p: *i32 = &x
  return p.* + 1
}
"#;
    assert_eq!(jit_eval(source), 6);
}

// ── Printing ─────────────────────────────────────────────────────────────

#[test]
fn println_executes_without_crashing() {
    let source = r#"
import fmt
const main = fn() -> i32 {
  fmt.println("Number: {:d}", 42)
  return 0
}
"#;
    assert_eq!(jit_eval(source), 0);
}

// ── Sample programs ──────────────────────────────────────────────────────

#[test]
fn sample_results() {
    for (name, expected) in [
        ("arithmetic", 23),
        ("loops", 40),
        ("recursion", 120),
        ("function_pointers", 20),
        ("printing", 0),
    ] {
        let path = format!("../samples/{name}.void");
        let source = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
        assert_eq!(jit_eval(&source), expected, "{name}.void");
    }
}
