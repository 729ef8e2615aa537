//! The per-namespace Type Registry (`spec.md` §4.T).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{Type, TypeRef};

/// Structural interning table for one [`crate::namespace::Namespace`].
///
/// Concurrency: during pass-1 a registry is owned exclusively by the
/// Parser instance building it. From pass-2 onward it is shared read-mostly
/// across threads (rayon parallel body parsing); the `Mutex` is held only
/// around the `add`/`get` pair so a miss-then-insert is atomic, per
/// `spec.md` §5's "Namespace takes an exclusive lock around the add/get
/// pair."
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: Mutex<HashMap<String, TypeRef>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Interns `ty`, returning the canonical shared reference. If an
    /// structurally equal type already exists, the new value is dropped and
    /// the existing `Arc` is returned; `spec.md`'s `add` returns only
    /// whether insertion happened, but in idiomatic Rust it is far more
    /// useful to hand back the canonical reference directly, so `intern`
    /// subsumes both `add` and `get` atomically. `was_new()` on the
    /// returned [`Interned`] recovers the boolean `spec.md` describes.
    pub fn intern(&self, ty: Type) -> Interned {
        let key = ty.canonical_string();
        let mut entries = self.entries.lock().expect("type registry poisoned");
        if let Some(existing) = entries.get(&key) {
            return Interned {
                type_ref: Arc::clone(existing),
                was_new: false,
            };
        }
        let type_ref = Arc::new(ty);
        entries.insert(key, Arc::clone(&type_ref));
        Interned {
            type_ref,
            was_new: true,
        }
    }

    /// Looks up an already-interned type by its canonical string, without
    /// constructing a candidate `Type` value. Mirrors `spec.md`'s `get`.
    pub fn get(&self, canonical: &str) -> Option<TypeRef> {
        self.entries
            .lock()
            .expect("type registry poisoned")
            .get(canonical)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("type registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of [`TypeRegistry::intern`].
pub struct Interned {
    type_ref: TypeRef,
    was_new: bool,
}

impl Interned {
    pub fn type_ref(&self) -> TypeRef {
        Arc::clone(&self.type_ref)
    }

    pub fn was_new(&self) -> bool {
        self.was_new
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Primitive;
    use proptest::prelude::*;

    #[test]
    fn equal_types_share_identity() {
        let registry = TypeRegistry::new();
        let a = registry
            .intern(Type::Array {
                element: Arc::new(Type::Primitive(Primitive::I32)),
                rank: 1,
            })
            .type_ref();
        let b = registry
            .intern(Type::Array {
                element: Arc::new(Type::Primitive(Primitive::I32)),
                rank: 1,
            })
            .type_ref();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn second_insert_is_not_new() {
        let registry = TypeRegistry::new();
        let first = registry.intern(Type::Primitive(Primitive::Bool));
        assert!(first.was_new());
        let second = registry.intern(Type::Primitive(Primitive::Bool));
        assert!(!second.was_new());
    }

    #[test]
    fn canonical_string_distinguishes_rank() {
        let elem = Arc::new(Type::Primitive(Primitive::I32));
        let rank1 = Type::Array {
            element: Arc::clone(&elem),
            rank: 1,
        };
        let rank2 = Type::Array {
            element: elem,
            rank: 2,
        };
        assert_eq!(rank1.canonical_string(), "i32[]");
        assert_eq!(rank2.canonical_string(), "i32[][]");
    }

    proptest! {
        /// Invariant 1: for any array rank, interning the same structural
        /// type twice in one registry always yields the same `Arc`.
        #[test]
        fn arrays_of_any_rank_intern_to_a_shared_arc(rank in 0u32..16) {
            let registry = TypeRegistry::new();
            let build = || Type::Array { element: Arc::new(Type::Primitive(Primitive::I32)), rank };
            let a = registry.intern(build()).type_ref();
            let b = registry.intern(build()).type_ref();
            prop_assert!(Arc::ptr_eq(&a, &b));
            prop_assert_eq!(a.canonical_string().matches("[]").count(), rank as usize);
        }
    }
}
