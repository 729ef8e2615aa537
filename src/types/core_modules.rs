//! The core module catalog (`spec.md` §6).
//!
//! Reproduced from `original_source/include/lexer/builtins.hpp`'s
//! `core_module_functions` map. Each recognized module name maps to its
//! function overload list; an overload is (parameter type spellings, return
//! type spellings, may-throw).

use std::collections::HashMap;
use std::sync::OnceLock;

/// One overload of a core module function: parameter types, return types,
/// and whether the call may throw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    pub params: Vec<&'static str>,
    pub returns: Vec<&'static str>,
    pub may_throw: bool,
}

/// All function names a core module exports, each with its overload set.
pub type FunctionOverloadList = HashMap<&'static str, Vec<Overload>>;

/// Returns `true` for the fixed set of importable core module names listed
/// in `spec.md` §6: `{assert, print, read, filesystem, env, system, time,
/// parse}`.
pub fn is_core_module(name: &str) -> bool {
    core_module_functions().contains_key(name)
}

/// Looks up a core module's function catalog.
pub fn module_functions(module: &str) -> Option<&'static FunctionOverloadList> {
    core_module_functions().get(module)
}

/// Looks up one function's overload set within a core module.
pub fn function_overloads(module: &str, function: &str) -> Option<&'static [Overload]> {
    core_module_functions()
        .get(module)
        .and_then(|funcs| funcs.get(function))
        .map(|v| v.as_slice())
}

fn ov(params: &[&'static str], returns: &[&'static str], may_throw: bool) -> Overload {
    Overload {
        params: params.to_vec(),
        returns: returns.to_vec(),
        may_throw,
    }
}

fn core_module_functions() -> &'static HashMap<&'static str, FunctionOverloadList> {
    static TABLE: OnceLock<HashMap<&'static str, FunctionOverloadList>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut modules: HashMap<&'static str, FunctionOverloadList> = HashMap::new();

        let mut assert_fns: FunctionOverloadList = HashMap::new();
        assert_fns.insert("assert", vec![ov(&["bool"], &["void"], true)]);
        modules.insert("assert", assert_fns);

        let mut print_fns: FunctionOverloadList = HashMap::new();
        print_fns.insert(
            "print",
            vec![
                ov(&["i32"], &["void"], false),
                ov(&["i64"], &["void"], false),
                ov(&["u32"], &["void"], false),
                ov(&["u64"], &["void"], false),
                ov(&["f32"], &["void"], false),
                ov(&["f64"], &["void"], false),
                ov(&["u8"], &["void"], false),
                ov(&["str"], &["void"], false),
                ov(&["__flint_type_str_lit"], &["void"], false),
                ov(&["bool"], &["void"], false),
            ],
        );
        modules.insert("print", print_fns);

        let mut read_fns: FunctionOverloadList = HashMap::new();
        read_fns.insert("read_str", vec![ov(&[], &["str"], false)]);
        read_fns.insert("read_i32", vec![ov(&[], &["i32"], true)]);
        read_fns.insert("read_i64", vec![ov(&[], &["i64"], true)]);
        read_fns.insert("read_u32", vec![ov(&[], &["u32"], true)]);
        read_fns.insert("read_u64", vec![ov(&[], &["u64"], true)]);
        read_fns.insert("read_f32", vec![ov(&[], &["f32"], true)]);
        read_fns.insert("read_f64", vec![ov(&[], &["f64"], true)]);
        modules.insert("read", read_fns);

        let mut filesystem_fns: FunctionOverloadList = HashMap::new();
        filesystem_fns.insert("read_file", vec![ov(&["str"], &["str"], true)]);
        filesystem_fns.insert("read_lines", vec![ov(&["str"], &["str[]"], true)]);
        filesystem_fns.insert("file_exists", vec![ov(&["str"], &["bool"], false)]);
        filesystem_fns.insert("write_file", vec![ov(&["str", "str"], &["void"], true)]);
        filesystem_fns.insert("append_file", vec![ov(&["str", "str"], &["void"], true)]);
        filesystem_fns.insert("is_file", vec![ov(&["str"], &["bool"], false)]);
        modules.insert("filesystem", filesystem_fns);

        let mut env_fns: FunctionOverloadList = HashMap::new();
        env_fns.insert("get_env", vec![ov(&["str"], &["str"], true)]);
        env_fns.insert(
            "set_env",
            vec![ov(&["str", "str", "bool"], &["bool"], false)],
        );
        modules.insert("env", env_fns);

        let mut system_fns: FunctionOverloadList = HashMap::new();
        system_fns.insert(
            "system_command",
            vec![ov(&["str"], &["i32", "str"], true)],
        );
        modules.insert("system", system_fns);

        // `time` and `parse` are part of the fixed recognized-module set in
        // `spec.md` §6 but their signatures were not part of the retained
        // original source excerpt; they are modeled as empty catalogs so
        // that `import time` / `import parse` are accepted by the
        // Namespace invariant (every imported core module name is one of
        // a fixed set) while still surfacing "unknown function" for any
        // call into them, which is the conservative and honest choice.
        modules.insert("time", HashMap::new());
        modules.insert("parse", HashMap::new());

        modules
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_fixed_module_set() {
        for name in [
            "assert",
            "print",
            "read",
            "filesystem",
            "env",
            "system",
            "time",
            "parse",
        ] {
            assert!(is_core_module(name), "{name} should be a core module");
        }
        assert!(!is_core_module("network"));
    }

    #[test]
    fn print_has_ten_overloads() {
        let overloads = function_overloads("print", "print").unwrap();
        assert_eq!(overloads.len(), 10);
    }

    #[test]
    fn assert_may_throw() {
        let overloads = function_overloads("assert", "assert").unwrap();
        assert!(overloads[0].may_throw);
    }
}
