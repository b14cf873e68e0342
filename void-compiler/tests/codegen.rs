use void_compiler::compile_to_ir_text;

fn compile_ir(source: &str) -> String {
    compile_to_ir_text(source).expect("source should compile")
}

// ── Functions and returns ────────────────────────────────────────────────

#[test]
fn trivial_function_signature_and_return() {
    let ir = compile_ir("const test = fn() -> i32 { return 42 }");
    assert!(ir.contains("define i32 @test()"), "IR was:\n{ir}");
    assert!(ir.contains("ret i32 42"), "IR was:\n{ir}");
}

#[test]
fn parameters_are_named_and_slotted() {
    let ir = compile_ir("const add = fn(x: i32, y: i32) -> i32 { return x + y }");
    assert!(ir.contains("define i32 @add(i32 %x, i32 %y)"), "IR was:\n{ir}");
    assert!(ir.contains("alloca i32"), "IR was:\n{ir}");
    assert!(ir.contains("add i32"), "IR was:\n{ir}");
}

#[test]
fn nil_function_gets_implicit_ret_void() {
    let ir = compile_ir("const noop = fn() { x := 1 }");
    assert!(ir.contains("define void @noop()"), "IR was:\n{ir}");
    assert!(ir.contains("ret void"), "IR was:\n{ir}");
}

#[test]
fn explicit_bare_return_in_nil_function() {
    let ir = compile_ir("const noop = fn() { return }");
    assert!(ir.contains("ret void"), "IR was:\n{ir}");
}

// ── Arithmetic and comparisons ───────────────────────────────────────────

#[test]
fn signed_arithmetic_instructions() {
    let ir = compile_ir(
        "const test = fn(a: i32, b: i32) -> i32 { return a + b - a * b / a }",
    );
    for inst in ["add i32", "sub i32", "mul i32", "sdiv i32"] {
        assert!(ir.contains(inst), "IR should contain '{inst}':\n{ir}");
    }
}

#[test]
fn signed_comparison_predicates() {
    let ir = compile_ir(
        r#"
const test = fn(a: i32, b: i32) -> i32 {
  p := a > b
  q := a < b
  r := a >= b
  s := a <= b
  t := a == b
  u := a != b
  return 0
}
"#,
    );
    for pred in ["icmp sgt", "icmp slt", "icmp sge", "icmp sle", "icmp eq", "icmp ne"] {
        assert!(ir.contains(pred), "IR should contain '{pred}':\n{ir}");
    }
}

#[test]
fn unary_minus_subtracts_from_zero() {
    let ir = compile_ir("const test = fn(a: i32) -> i32 { return -a }");
    assert!(ir.contains("sub i32 0"), "IR was:\n{ir}");
}

#[test]
fn not_is_complement_on_i1() {
    let ir = compile_ir("const test = fn(a: bool) -> bool { return not a }");
    assert!(ir.contains("xor i1"), "IR was:\n{ir}");
}

// ── Short-circuit logic ──────────────────────────────────────────────────

#[test]
fn logical_and_branches_before_the_right_operand() {
    let ir = compile_ir(
        "const test = fn(a: bool, b: bool) -> bool { return a and b }",
    );
    assert!(ir.contains("and.rhs:"), "IR was:\n{ir}");
    assert!(ir.contains("and.end:"), "IR was:\n{ir}");
    assert!(ir.contains("phi i1"), "IR was:\n{ir}");
}

#[test]
fn logical_or_branches_before_the_right_operand() {
    let ir = compile_ir(
        "const test = fn(a: bool, b: bool) -> bool { return a or b }",
    );
    assert!(ir.contains("or.rhs:"), "IR was:\n{ir}");
    assert!(ir.contains("or.end:"), "IR was:\n{ir}");
    assert!(ir.contains("phi i1"), "IR was:\n{ir}");
}

// ── Variables ────────────────────────────────────────────────────────────

#[test]
fn declaration_assignment_and_load() {
    let ir = compile_ir(
        "const test = fn() -> i32 { x: i32 = 100\n x = x * 2\n return x }",
    );
    assert!(ir.contains("alloca i32"), "IR was:\n{ir}");
    assert!(ir.contains("store i32"), "IR was:\n{ir}");
    assert!(ir.contains("load i32"), "IR was:\n{ir}");
}

#[test]
fn declared_width_is_honored_at_the_slot() {
    let ir = compile_ir("const test = fn() -> i32 { x: i64 = 100\n return 0 }");
    assert!(ir.contains("alloca i64"), "IR was:\n{ir}");
    assert!(ir.contains("store i64 100"), "IR was:\n{ir}");
}

#[test]
fn widening_assignment_sign_extends() {
    let ir = compile_ir(
        "const test = fn(a: i32) -> i32 { x: i64 = 0\n x = a\n return 0 }",
    );
    assert!(ir.contains("sext i32"), "IR was:\n{ir}");
}

#[test]
fn narrowing_return_truncates() {
    let ir = compile_ir(
        "const test = fn() -> i8 { x: i64 = 0\n y := 1\n x = x + x\n return x }",
    );
    assert!(ir.contains("trunc i64"), "IR was:\n{ir}");
}

#[test]
fn unsigned_operand_widening_zero_extends() {
    let ir = compile_ir(
        "const test = fn(a: u8, b: u64) -> i32 { c: u64 = a + b\n return 0 }",
    );
    assert!(ir.contains("zext i8"), "IR was:\n{ir}");
    assert!(!ir.contains("sext i8"), "IR was:\n{ir}");
}

#[test]
fn unsigned_assignment_zero_extends() {
    let ir = compile_ir(
        "const test = fn(a: u16) -> i32 { x: u64 = 0\n x = a\n return 0 }",
    );
    assert!(ir.contains("zext i16"), "IR was:\n{ir}");
}

// ── Control flow ─────────────────────────────────────────────────────────

#[test]
fn if_else_block_shape() {
    let ir = compile_ir(
        r#"
const test = fn(x: i32) -> i32 {
  if x > 10 { return 1 } else { return 2 }
}
"#,
    );
    for label in ["then:", "else:", "br i1", "icmp sgt"] {
        assert!(ir.contains(label), "IR should contain '{label}':\n{ir}");
    }
}

#[test]
fn if_without_else_falls_through_to_merge() {
    let ir = compile_ir(
        "const test = fn(x: i32) -> i32 { if x > 0 do return 1\n return 0 }",
    );
    assert!(ir.contains("merge:"), "IR was:\n{ir}");
}

#[test]
fn range_loop_block_shape() {
    let ir = compile_ir(
        "const test = fn() -> i32 { sum := 0\n loop i in 0..10 do sum = sum + i\n return sum }",
    );
    for label in ["loop.cond:", "loop.body:", "loop.end:", "icmp slt", "br i1"] {
        assert!(ir.contains(label), "IR should contain '{label}':\n{ir}");
    }
}

#[test]
fn conditional_loop_block_shape() {
    let ir = compile_ir(
        "const test = fn() -> i32 { x := 10\n loop if x > 0 do x = x - 1\n return x }",
    );
    for label in ["loop.cond:", "loop.body:", "loop.end:"] {
        assert!(ir.contains(label), "IR should contain '{label}':\n{ir}");
    }
}

#[test]
fn nested_loops_get_distinct_blocks() {
    let ir = compile_ir(
        r#"
const test = fn() -> i32 {
  sum := 0
  loop i in 0..3 {
    loop j in 0..3 {
      sum = sum + i * j
    }
  }
  return sum
}
"#,
    );
    let cond_count = ir.matches("loop.cond").count();
    assert!(cond_count >= 2, "expected two loop.cond blocks:\n{ir}");
}

// ── Calls ────────────────────────────────────────────────────────────────

#[test]
fn direct_call_by_name() {
    let ir = compile_ir(
        r#"
const helper = fn(x: i32) -> i32 { return x }
const main = fn() -> i32 { return helper(42) }
"#,
    );
    assert!(ir.contains("call i32 @helper(i32 42)"), "IR was:\n{ir}");
}

#[test]
fn function_pointer_variable_and_indirect_call() {
    let ir = compile_ir(
        r#"
const add = fn(x: i32, y: i32) -> i32 { return x + y }
const main = fn() -> i32 {
  op: fn(i32, i32) -> i32 = add
  return op(5, 3)
}
"#,
    );
    // The callee is loaded from the slot and called indirectly.
    assert!(ir.contains("alloca ptr"), "IR was:\n{ir}");
    assert!(ir.contains("load ptr"), "IR was:\n{ir}");
    assert!(ir.contains("call i32 %"), "IR was:\n{ir}");
}

#[test]
fn unsigned_argument_is_zero_extended_at_direct_calls() {
    let ir = compile_ir(
        r#"
const take = fn(x: u64) -> i32 { return 0 }
const main = fn() -> i32 {
  a: u8 = 1
  return take(a)
}
"#,
    );
    assert!(ir.contains("zext i8"), "IR was:\n{ir}");
    assert!(!ir.contains("sext i8"), "IR was:\n{ir}");
}

#[test]
fn named_function_used_as_value() {
    let ir = compile_ir(
        r#"
const inc = fn(x: i32) -> i32 { return x + 1 }
const main = fn() -> i32 {
  f: fn(i32) -> i32 = inc
  return 0
}
"#,
    );
    assert!(ir.contains("store ptr @inc"), "IR was:\n{ir}");
}

// ── Anonymous functions ──────────────────────────────────────────────────

#[test]
fn anonymous_function_is_internal_and_numbered() {
    let ir = compile_ir(
        r#"
const main = fn() -> i32 {
  op: fn(i32, i32) -> i32 = fn(a: i32, b: i32) -> i32 do return a + b
  return op(4, 6)
}
"#,
    );
    assert!(
        ir.contains("define internal i32 @anon_0(i32 %a, i32 %b)"),
        "IR was:\n{ir}"
    );
}

#[test]
fn anonymous_functions_get_fresh_names() {
    let ir = compile_ir(
        r#"
const main = fn() -> i32 {
  f: fn() -> i32 = fn() -> i32 do return 1
  g: fn() -> i32 = fn() -> i32 do return 2
  return f() + g()
}
"#,
    );
    assert!(ir.contains("@anon_0"), "IR was:\n{ir}");
    assert!(ir.contains("@anon_1"), "IR was:\n{ir}");
}

#[test]
fn builder_resumes_after_anonymous_function() {
    // The statement after the anonymous literal must land back in main.
    let ir = compile_ir(
        r#"
const main = fn() -> i32 {
  f: fn() -> i32 = fn() -> i32 do return 7
  x: i32 = 1
  return x
}
"#,
    );
    assert!(ir.contains("define i32 @main()"), "IR was:\n{ir}");
    assert!(ir.contains("ret i32"), "IR was:\n{ir}");
}

// ── fmt.println ──────────────────────────────────────────────────────────

#[test]
fn println_lowers_to_printf() {
    let ir = compile_ir(
        r#"
import fmt
const main = fn() -> i32 {
  fmt.println("Hello, world!")
  return 0
}
"#,
    );
    assert!(ir.contains("@printf"), "IR was:\n{ir}");
    assert!(ir.contains("Hello, world!"), "IR was:\n{ir}");
}

#[test]
fn println_rewrites_format_directives() {
    let ir = compile_ir(
        r#"
import fmt
const main = fn() -> i32 {
  fmt.println("Number: {:d}", 42)
  fmt.println("String: {:s}", "hello")
  return 0
}
"#,
    );
    assert!(ir.contains("Number: %d"), "IR was:\n{ir}");
    assert!(ir.contains("String: %s"), "IR was:\n{ir}");
    assert!(!ir.contains("{:d}"), "IR was:\n{ir}");
    assert!(!ir.contains("{:s}"), "IR was:\n{ir}");
}

#[test]
fn println_accepts_an_empty_string() {
    let ir = compile_ir(
        "import fmt\nconst main = fn() -> i32 { fmt.println(\"\")\n return 0 }",
    );
    assert!(ir.contains("@printf"), "IR was:\n{ir}");
}

// ── Strings and pointers ─────────────────────────────────────────────────

#[test]
fn string_literal_becomes_a_global() {
    let ir = compile_ir(
        "const test = fn() -> i32 { s := \"abc\"\n return 0 }",
    );
    assert!(ir.contains("abc"), "IR was:\n{ir}");
    assert!(ir.contains("private unnamed_addr constant"), "IR was:\n{ir}");
}

#[test]
fn address_of_and_deref() {
    let ir = compile_ir(
        r#"
const test = fn() -> i32 {
  x: i32 = 5
  p: *i32 = &x
  return p.*
}
"#,
    );
    assert!(ir.contains("alloca ptr"), "IR was:\n{ir}");
    assert!(ir.contains("load ptr"), "IR was:\n{ir}");
    assert!(ir.contains("load i32"), "IR was:\n{ir}");
}

// ── Sample programs ──────────────────────────────────────────────────────

#[test]
fn samples_compile_to_ir() {
    for name in [
        "arithmetic",
        "loops",
        "recursion",
        "function_pointers",
        "printing",
    ] {
        let path = format!("../samples/{name}.void");
        let source = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read {path}: {e}"));
        let ir = compile_ir(&source);
        assert!(!ir.is_empty(), "{name}.void should produce IR");
        assert!(ir.contains("define i32 @main()"), "{name}.void IR:\n{ir}");
    }
}
