//! Phase G: global registries.
//!
//! A `Registries` value is created once per compile run and threaded
//! explicitly through the Parser, Resolver and Analyzer — Design Note
//! "replace ad-hoc mutex+static patterns with a single 'process
//! registries' object passed explicitly to every Parser instance." This
//! makes fresh registries per test trivial (just construct a new one) and
//! removes hidden global state.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::ast::{CallNodeBase, DefinitionRef};
use crate::hash::FileHash;

/// The four "global monotonic counters" `spec.md` §3 requires: each hands
/// out a fresh integer per invocation, thread-safe, never recycled within
/// one compile run.
#[derive(Debug, Default)]
struct Counters {
    scope_id: AtomicU64,
    group_id: AtomicU64,
    test_id: AtomicU64,
}

/// One function definition as recorded for call resolution: the
/// definition itself plus the name of the file it was parsed from.
pub type ParsedFunction = (DefinitionRef, String);

pub struct Registries {
    counters: Counters,
    /// Call arena: the call-id *is* the index (Design Note "arena +
    /// index"). Arena insertion order is parse order, which is exactly
    /// the "ordered map" `spec.md` §4.P asks `parsed_calls` to be — no
    /// extra ordering machinery is needed.
    calls: Mutex<Vec<CallNodeBase>>,
    parsed_functions: Mutex<Vec<ParsedFunction>>,
    parsed_tests: Mutex<Vec<ParsedFunction>>,
    parsed_data: Mutex<HashMap<String, Vec<DefinitionRef>>>,
    test_names: Mutex<HashMap<String, HashSet<String>>>,
    generated_files: Mutex<HashSet<FileHash>>,
}

impl Registries {
    pub fn new() -> Self {
        Self {
            counters: Counters::default(),
            calls: Mutex::new(Vec::new()),
            parsed_functions: Mutex::new(Vec::new()),
            parsed_tests: Mutex::new(Vec::new()),
            parsed_data: Mutex::new(HashMap::new()),
            test_names: Mutex::new(HashMap::new()),
            generated_files: Mutex::new(HashSet::new()),
        }
    }

    pub fn next_scope_id(&self) -> u64 {
        self.counters.scope_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_group_id(&self) -> u64 {
        self.counters.group_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_test_id(&self) -> u64 {
        self.counters.test_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts a call node into the arena, stamping its `call_id` with the
    /// resulting index, and returns that id.
    pub fn push_call(&self, mut call: CallNodeBase) -> u64 {
        let mut calls = self.calls.lock().expect("call arena poisoned");
        let id = calls.len() as u64;
        call.call_id = id;
        calls.push(call);
        id
    }

    /// The id of the most recently pushed call, for `catch` resolution
    /// (`spec.md` §4.P: "`catch` refers to the most recently parsed
    /// call"). `None` if no call has been parsed yet in this run.
    pub fn last_call_id(&self) -> Option<u64> {
        let calls = self.calls.lock().expect("call arena poisoned");
        if calls.is_empty() {
            None
        } else {
            Some((calls.len() - 1) as u64)
        }
    }

    pub fn mark_has_catch(&self, call_id: u64) {
        let mut calls = self.calls.lock().expect("call arena poisoned");
        if let Some(call) = calls.get_mut(call_id as usize) {
            call.has_catch = true;
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call arena poisoned").len()
    }

    pub fn with_call<R>(&self, call_id: u64, f: impl FnOnce(&CallNodeBase) -> R) -> Option<R> {
        self.calls
            .lock()
            .expect("call arena poisoned")
            .get(call_id as usize)
            .map(f)
    }

    pub fn call_ids_in_order(&self) -> Vec<u64> {
        (0..self.call_count() as u64).collect()
    }

    pub fn register_function(&self, def: DefinitionRef, file_name: String) {
        self.parsed_functions
            .lock()
            .expect("parsed_functions poisoned")
            .push((def, file_name));
    }

    /// Resolves a call by the (name, argument-type list) tuple described
    /// in `spec.md` §4.P. Returns the single matching function's index
    /// within `parsed_functions`, or an error describing whether zero or
    /// multiple candidates were found.
    pub fn resolve_function(
        &self,
        name: &str,
        arg_types: &[String],
    ) -> Result<usize, OverloadResolutionError> {
        let functions = self.parsed_functions.lock().expect("parsed_functions poisoned");
        let mut matches = Vec::new();
        for (index, (def, _file)) in functions.iter().enumerate() {
            if let crate::ast::DefinitionKind::Function(f) = def.as_ref() {
                let (fname, ftypes) = f.signature_key();
                if fname == name && ftypes == arg_types {
                    matches.push(index);
                }
            }
        }
        match matches.len() {
            0 => Err(OverloadResolutionError::NoMatch),
            1 => Ok(matches[0]),
            _ => Err(OverloadResolutionError::Ambiguous(matches)),
        }
    }

    pub fn function_at(&self, index: usize) -> Option<ParsedFunction> {
        self.parsed_functions
            .lock()
            .expect("parsed_functions poisoned")
            .get(index)
            .cloned()
    }

    pub fn parsed_function_count(&self) -> usize {
        self.parsed_functions.lock().expect("parsed_functions poisoned").len()
    }

    pub fn register_test(&self, def: DefinitionRef, file_name: String) {
        self.parsed_tests.lock().expect("parsed_tests poisoned").push((def, file_name));
    }

    pub fn register_data(&self, file_name: String, def: DefinitionRef) {
        self.parsed_data
            .lock()
            .expect("parsed_data poisoned")
            .entry(file_name)
            .or_default()
            .push(def);
    }

    pub fn data_in_file(&self, file_name: &str) -> Vec<DefinitionRef> {
        self.parsed_data
            .lock()
            .expect("parsed_data poisoned")
            .get(file_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Registers a test name within a file. Returns `true` the first time
    /// a (file, name) pair is seen, `false` on every subsequent collision
    /// — mirrors `check_test_name` (`spec.md` §4.P, §8 invariant 7).
    pub fn check_test_name(&self, file_name: &str, test_name: &str) -> bool {
        let mut names = self.test_names.lock().expect("test_names poisoned");
        let set = names.entry(file_name.to_string()).or_default();
        set.insert(test_name.to_string())
    }

    pub fn mark_generated(&self, file: FileHash) {
        self.generated_files.lock().expect("generated_files poisoned").insert(file);
    }

    pub fn is_generated(&self, file: FileHash) -> bool {
        self.generated_files.lock().expect("generated_files poisoned").contains(&file)
    }

    /// Clears all registry state. `spec.md` §4.G: "registries must be
    /// cleared before AST owners are destroyed, to avoid dangling
    /// pointers in consumer code." Since this crate never hands out raw
    /// pointers (only `Arc`s and arena indices), clearing early is no
    /// longer a safety requirement, but the method is kept so a long-
    /// lived host process (e.g. an LSP server reusing one `Registries`
    /// across recompiles) has an explicit reset point.
    pub fn clear(&self) {
        self.calls.lock().expect("call arena poisoned").clear();
        self.parsed_functions.lock().expect("parsed_functions poisoned").clear();
        self.parsed_tests.lock().expect("parsed_tests poisoned").clear();
        self.parsed_data.lock().expect("parsed_data poisoned").clear();
        self.test_names.lock().expect("test_names poisoned").clear();
        self.generated_files.lock().expect("generated_files poisoned").clear();
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverloadResolutionError {
    NoMatch,
    Ambiguous(Vec<usize>),
}

impl std::fmt::Display for OverloadResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverloadResolutionError::NoMatch => write!(f, "no matching function overload"),
            OverloadResolutionError::Ambiguous(candidates) => {
                write!(f, "ambiguous call: {} matching overloads", candidates.len())
            }
        }
    }
}

impl std::error::Error for OverloadResolutionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn scope_ids_are_unique_and_increasing() {
        let registries = Registries::new();
        let ids: Vec<u64> = (0..100).map(|_| registries.next_scope_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn scope_ids_are_unique_under_concurrent_parallel_parsing() {
        let registries = Registries::new();
        let mut ids: Vec<u64> = (0..4000u64)
            .into_par_iter()
            .map(|_| registries.next_scope_id())
            .collect();
        ids.sort_unstable();
        let before_dedup = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before_dedup, "scope ids collided under concurrent allocation");
    }

    #[test]
    fn test_name_collision_detected() {
        let registries = Registries::new();
        assert!(registries.check_test_name("a.flint", "t"));
        assert!(!registries.check_test_name("a.flint", "t"));
        assert!(registries.check_test_name("b.flint", "t"));
    }

    #[test]
    fn call_id_equals_arena_index() {
        use crate::ast::CallNodeBase;
        use crate::types::{Primitive, Type};
        use std::sync::Arc;

        let registries = Registries::new();
        let make_call = || CallNodeBase {
            function_index: None,
            core_module_call: None,
            arguments: vec![],
            error_types: vec![],
            return_type: Arc::new(Type::Primitive(Primitive::Void)),
            scope_id: 0,
            has_catch: false,
            call_id: 0,
        };
        let first = registries.push_call(make_call());
        let second = registries.push_call(make_call());
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(registries.last_call_id(), Some(1));
    }
}
