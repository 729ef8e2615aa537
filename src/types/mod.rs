//! Phase T: Type Registry
//!
//! Types are structurally interned per [`crate::namespace::Namespace`]: two
//! structurally equal `Type` values created in the same namespace share
//! object identity through an `Arc`. This module holds the `Type` sum type,
//! the per-namespace registry, the pre-interned primitive table and the
//! casting tables reproduced from the original compiler's builtin catalog.

pub mod core_modules;
pub mod primitives;
pub mod registry;

use std::fmt;
use std::sync::Arc;

pub use registry::TypeRegistry;

/// A reference to a possibly-shared `Type`. Every AST node that mentions a
/// type holds one of these; its lifetime is the whole compile run.
pub type TypeRef = Arc<Type>;

/// The type sum, per `spec.md` §3 "Core entities / Type".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Primitive),
    Array {
        element: TypeRef,
        rank: u32,
    },
    Optional(TypeRef),
    /// An ordered, fixed-arity tuple type ("group type" in the glossary).
    Group(Vec<TypeRef>),
    Range {
        bound: TypeRef,
    },
    /// A named record (`data` definition).
    Data { name: String },
    /// A named tagged union (`variant` definition).
    Variant { name: String },
    /// A named enumeration (`enum` definition).
    Enum { name: String },
    Function {
        params: Vec<TypeRef>,
        returns: Vec<TypeRef>,
        errors: Vec<TypeRef>,
    },
    /// `extern`-only pointer type; the Analyzer enforces the extern-only
    /// restriction (`spec.md` §4.A).
    Pointer { inner: TypeRef },
}

/// Primitive scalar and SIMD types, pre-interned process-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    /// 8-bit boolean-as-byte, distinct from `Bool` in the casting tables.
    Bool8,
    Str,
    Void,
    /// Internal literal-string type, used only before a `str` coercion is
    /// applied; never produced by user-written type annotations.
    StrLit,
    I32x2,
    I32x3,
    I32x4,
    I32x8,
    I64x2,
    I64x3,
    I64x4,
    F32x2,
    F32x3,
    F32x4,
    F32x8,
    F64x2,
    F64x3,
    F64x4,
}

impl Primitive {
    /// The spelling used both for source-level keywords and for canonical
    /// type strings (`spec.md` §4.T: "primitives use their spelling").
    pub fn spelling(self) -> &'static str {
        use Primitive::*;
        match self {
            I8 => "i8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
            F32 => "f32",
            F64 => "f64",
            Bool => "bool",
            Bool8 => "bool8",
            Str => "str",
            Void => "void",
            StrLit => "__flint_type_str_lit",
            I32x2 => "i32x2",
            I32x3 => "i32x3",
            I32x4 => "i32x4",
            I32x8 => "i32x8",
            I64x2 => "i64x2",
            I64x3 => "i64x3",
            I64x4 => "i64x4",
            F32x2 => "f32x2",
            F32x3 => "f32x3",
            F32x4 => "f32x4",
            F32x8 => "f32x8",
            F64x2 => "f64x2",
            F64x3 => "f64x3",
            F64x4 => "f64x4",
        }
    }

    pub fn from_spelling(s: &str) -> Option<Self> {
        use Primitive::*;
        Some(match s {
            "i8" => I8,
            "i16" => I16,
            "i32" => I32,
            "i64" => I64,
            "u8" => U8,
            "u16" => U16,
            "u32" => U32,
            "u64" => U64,
            "f32" => F32,
            "f64" => F64,
            "bool" => Bool,
            "bool8" => Bool8,
            "str" => Str,
            "void" => Void,
            "__flint_type_str_lit" => StrLit,
            "i32x2" => I32x2,
            "i32x3" => I32x3,
            "i32x4" => I32x4,
            "i32x8" => I32x8,
            "i64x2" => I64x2,
            "i64x3" => I64x3,
            "i64x4" => I64x4,
            "f32x2" => F32x2,
            "f32x3" => F32x3,
            "f32x4" => F32x4,
            "f32x8" => F32x8,
            "f64x2" => F64x2,
            "f64x3" => F64x3,
            "f64x4" => F64x4,
            _ => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        use Primitive::*;
        matches!(self, I8 | I16 | I32 | I64 | U8 | U16 | U32 | U64)
    }
}

impl Type {
    /// The deterministic canonical string form described in `spec.md`
    /// §4.T. This is the key the registry interns by.
    pub fn canonical_string(&self) -> String {
        match self {
            Type::Primitive(p) => p.spelling().to_string(),
            Type::Array { element, rank } => {
                let mut s = element.canonical_string();
                for _ in 0..*rank {
                    s.push_str("[]");
                }
                s
            }
            Type::Optional(inner) => format!("{}?", inner.canonical_string()),
            Type::Group(items) => {
                let parts: Vec<String> = items.iter().map(|t| t.canonical_string()).collect();
                format!("({})", parts.join(", "))
            }
            Type::Range { bound } => format!("range<{}>", bound.canonical_string()),
            Type::Data { name } => name.clone(),
            Type::Variant { name } => name.clone(),
            Type::Enum { name } => name.clone(),
            Type::Function {
                params,
                returns,
                errors,
            } => {
                let p: Vec<String> = params.iter().map(|t| t.canonical_string()).collect();
                let r: Vec<String> = returns.iter().map(|t| t.canonical_string()).collect();
                let e: Vec<String> = errors.iter().map(|t| t.canonical_string()).collect();
                format!("({}) -> ({}) !({})", p.join(", "), r.join(", "), e.join(", "))
            }
            Type::Pointer { inner } => format!("ptr<{}>", inner.canonical_string()),
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_integer())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}
