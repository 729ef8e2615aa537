//! Pre-interned primitive accessors and the primitive casting tables.
//!
//! The casting tables are reproduced verbatim (spelling and membership)
//! from the original compiler's `include/lexer/builtins.hpp`, as `spec.md`
//! §6 requires: "These tables are part of the spec."

use std::collections::HashMap;
use std::sync::OnceLock;

use super::Primitive;

/// Returns the explicit-cast target list for a primitive's spelling, or
/// `None` if the primitive has no explicit casts at all.
pub fn explicit_casts(from: &str) -> Option<&'static [&'static str]> {
    explicit_casting_table().get(from).copied()
}

/// Returns the implicit-cast target list for a primitive's spelling
/// (includes the SIMD tuple decompositions, e.g. `i32x4 -> (i32, i32, i32,
/// i32)`), or `None` if none are defined.
pub fn implicit_casts(from: &str) -> Option<&'static [&'static str]> {
    implicit_casting_table().get(from).copied()
}

pub fn can_cast_explicitly(from: &str, to: &str) -> bool {
    explicit_casts(from).map(|list| list.contains(&to)).unwrap_or(false)
}

pub fn can_cast_implicitly(from: &str, to: &str) -> bool {
    implicit_casts(from).map(|list| list.contains(&to)).unwrap_or(false)
}

/// `primitive_casting_table` from `original_source/include/lexer/builtins.hpp`.
fn explicit_casting_table() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("__flint_type_str_lit", &["str"]);
        m.insert("i32", &["str", "u8", "i64", "f32", "f64", "u32", "u64"]);
        m.insert("i64", &["str", "u8", "i32", "f32", "f64", "u32", "u64"]);
        m.insert("u32", &["str", "u8", "i32", "i64", "f32", "f64", "u64"]);
        m.insert("u64", &["str", "u8", "i32", "i64", "f32", "f64", "u32"]);
        m.insert("f32", &["str", "i32", "i64", "f64", "u32", "u64"]);
        m.insert("f64", &["str", "i32", "i64", "f32", "u32", "u64"]);
        m.insert("u8", &["bool8", "str", "i32", "i64", "u32", "u64"]);
        m.insert("bool", &["str"]);
        m.insert("bool8", &["str", "u8"]);
        m
    })
}

/// `primitive_implicit_casting_table` from
/// `original_source/include/lexer/builtins.hpp`.
fn implicit_casting_table() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("__flint_type_str_lit", &["str"]);
        m.insert(
            "i32",
            &[
                "str", "u32", "u64", "i64", "f32", "f64", "i32x2", "i32x3", "i32x4", "i32x8",
            ],
        );
        m.insert("i64", &["str", "i64x2", "i64x3", "i64x4"]);
        m.insert("u32", &["str", "i32", "i64", "u64", "f32", "f64"]);
        m.insert("u64", &["str"]);
        m.insert("f32", &["str", "f64", "f32x2", "f32x3", "f32x4", "f32x8"]);
        m.insert("f64", &["str", "f64x2", "f64x3", "f64x4"]);
        m.insert("bool", &["str"]);
        m.insert("u8", &["bool8", "str", "i32", "u32", "i64", "u64"]);
        m.insert("bool8", &["u8", "str"]);
        m.insert("(i32, i32)", &["i32x2"]);
        m.insert("(i32, i32, i32)", &["i32x3"]);
        m.insert("(i32, i32, i32, i32)", &["i32x4"]);
        m.insert(
            "(i32, i32, i32, i32, i32, i32, i32, i32)",
            &["i32x8"],
        );
        m.insert("i32x2", &["(i32, i32)", "str"]);
        m.insert("i32x3", &["(i32, i32, i32)", "str"]);
        m.insert("i32x4", &["(i32, i32, i32, i32)", "str"]);
        m.insert(
            "i32x8",
            &["(i32, i32, i32, i32, i32, i32, i32, i32)", "str"],
        );
        m.insert("(i64, i64)", &["i64x2"]);
        m.insert("(i64, i64, i64)", &["i64x3"]);
        m.insert("(i64, i64, i64, i64)", &["i64x4"]);
        m.insert("i64x2", &["(i64, i64)", "str"]);
        m.insert("i64x3", &["(i64, i64, i64)", "str"]);
        m.insert("i64x4", &["(i64, i64, i64, i64)", "str"]);
        m.insert("(f32, f32)", &["f32x2"]);
        m.insert("(f32, f32, f32)", &["f32x3"]);
        m.insert("(f32, f32, f32, f32)", &["f32x4"]);
        m.insert(
            "(f32, f32, f32, f32, f32, f32, f32, f32)",
            &["f32x8"],
        );
        m.insert("f32x2", &["(f32, f32)", "str"]);
        m.insert("f32x3", &["(f32, f32, f32)", "str"]);
        m.insert("f32x4", &["(f32, f32, f32, f32)", "str"]);
        m.insert(
            "f32x8",
            &["(f32, f32, f32, f32, f32, f32, f32, f32)", "str"],
        );
        m.insert("(f64, f64)", &["f64x2"]);
        m.insert("(f64, f64, f64)", &["f64x3"]);
        m.insert("(f64, f64, f64, f64)", &["f64x4"]);
        m.insert("f64x2", &["(f64, f64)", "str"]);
        m.insert("f64x3", &["(f64, f64, f64)", "str"]);
        m.insert("f64x4", &["(f64, f64, f64, f64)", "str"]);
        m
    })
}

/// All primitive spellings, for iteration (used by the Driver's
/// `--dump-namespace` introspection and by property tests).
pub const ALL_PRIMITIVES: &[Primitive] = &[
    Primitive::I8,
    Primitive::I16,
    Primitive::I32,
    Primitive::I64,
    Primitive::U8,
    Primitive::U16,
    Primitive::U32,
    Primitive::U64,
    Primitive::F32,
    Primitive::F64,
    Primitive::Bool,
    Primitive::Bool8,
    Primitive::Str,
    Primitive::Void,
    Primitive::I32x2,
    Primitive::I32x3,
    Primitive::I32x4,
    Primitive::I32x8,
    Primitive::I64x2,
    Primitive::I64x3,
    Primitive::I64x4,
    Primitive::F32x2,
    Primitive::F32x3,
    Primitive::F32x4,
    Primitive::F32x8,
    Primitive::F64x2,
    Primitive::F64x3,
    Primitive::F64x4,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i32_casts_to_str() {
        assert!(can_cast_explicitly("i32", "str"));
    }

    #[test]
    fn i32x4_decomposes_to_tuple() {
        assert!(can_cast_implicitly("i32x4", "(i32, i32, i32, i32)"));
    }

    #[test]
    fn unknown_primitive_has_no_casts() {
        assert!(explicit_casts("void").is_none());
    }
}
