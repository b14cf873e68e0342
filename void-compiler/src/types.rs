//! Surface types, represented as canonical strings.
//!
//! Types stay textual all the way to code generation: `i32`, `bool`,
//! `const string`, `*i32`, `fn(i32, i32) -> i32`. Equality of two types is
//! equality of their canonical strings.

/// The unit return type. `void` is accepted as an alternate spelling.
pub const NIL: &str = "nil";

pub fn is_void(ty: &str) -> bool {
    ty == "nil" || ty == "void"
}

pub fn is_integer_type(ty: &str) -> bool {
    matches!(ty, "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64")
}

pub fn is_signed_integer(ty: &str) -> bool {
    matches!(ty, "i8" | "i16" | "i32" | "i64")
}

pub fn integer_bit_width(ty: &str) -> Option<u32> {
    match ty {
        "i8" | "u8" => Some(8),
        "i16" | "u16" => Some(16),
        "i32" | "u32" => Some(32),
        "i64" | "u64" => Some(64),
        _ => None,
    }
}

pub fn is_string_type(ty: &str) -> bool {
    ty == "string" || ty == "const string"
}

pub fn is_pointer_type(ty: &str) -> bool {
    ty.starts_with('*')
}

/// The pointed-to type of `*T`.
pub fn pointee_type(ty: &str) -> Option<&str> {
    ty.strip_prefix('*')
}

pub fn is_function_type(ty: &str) -> bool {
    ty.starts_with("fn(")
}

/// Render a function-pointer type in its canonical form:
/// `fn(P1, P2) -> R`, one space after each comma and around the arrow.
pub fn canonical_fn_type(param_types: &[String], return_type: &str) -> String {
    let mut out = String::from("fn(");
    for (i, p) in param_types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(p);
    }
    out.push_str(") -> ");
    out.push_str(return_type);
    out
}

/// Split a canonical function-pointer type back into parameter types and
/// return type. Only the canonical spacing is recognized.
pub fn parse_fn_type(ty: &str) -> Option<(Vec<String>, String)> {
    let rest = ty.strip_prefix("fn(")?;
    let close = find_matching_paren(rest)?;
    let params_str = &rest[..close];
    let ret = rest[close + 1..].strip_prefix(" -> ")?;

    let params = if params_str.is_empty() {
        Vec::new()
    } else {
        split_top_level(params_str)
    };
    Some((params, ret.to_string()))
}

// Index of the ')' closing the parameter list, allowing nested fn( ... )
// parameter types.
fn find_matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

// Split "i32, fn(i32) -> i32, bool" on top-level commas only.
fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = s.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(s[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(s[start..].trim().to_string());
    parts
}
