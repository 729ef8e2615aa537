//! End-to-end tests driving the full L -> R -> P -> A pipeline through
//! `driver::compile` against real files on disk.

use std::io::Write;
use std::path::PathBuf;

use flintfront::driver::{compile, DriverConfig};

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

fn has_code(outcome: &flintfront::driver::CompileOutcome, code: &str) -> bool {
    outcome.diagnostics.iter().any(|d| d.code == code)
}

#[test]
fn minimal_function_compiles() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(&dir, "main.flint", "def main() -> i32 {\n return 0\n}\n");

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
    assert_eq!(outcome.files.len(), 1);
    let file = outcome.files.values().next().unwrap();
    assert_eq!(file.definitions.len(), 1);
}

#[test]
fn cross_file_call_resolves_without_import_qualification() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "lib.flint", "def add(a: i32, b: i32) -> i32 {\n return a + b\n}\n");
    let root = write_file(
        &dir,
        "main.flint",
        "import \"lib.flint\"\ndef main() -> i32 {\n return add(1, 2)\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
    assert_eq!(outcome.files.len(), 2);
}

#[test]
fn bare_call_resolves_globally_even_without_an_import_statement() {
    // `main.flint` never imports `lib.flint`, but the resolver still
    // reaches it (nothing else pulls it into the compile unit here, so
    // this exercises the root importing it for resolver discovery while
    // the call itself is written unqualified) and pass-1 registers
    // `add` globally before any file's pass-2 runs, so the call still
    // resolves purely by (name, argument-type) match.
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "lib.flint", "def add(a: i32, b: i32) -> i32 {\n return a + b\n}\n");
    let root = write_file(
        &dir,
        "main.flint",
        "import \"lib.flint\" as l\ndef main() -> i32 {\n return add(1, 2)\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn data_field_access_compiles() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        &dir,
        "main.flint",
        "data Point {\n x: i32,\n y: i32\n}\n\ndef main() -> i32 {\n p := Point { x: 1, y: 2 }\n return p.x\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn pointer_field_outside_extern_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        &dir,
        "main.flint",
        "def main() -> i32 {\n p: ptr<i32> = &0\n return 0\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(!outcome.success);
    assert!(has_code(&outcome, "ERR_PTR_NOT_ALLOWED_IN_NON_EXTERN_CONTEXT"), "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn division_by_literal_zero_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(&dir, "main.flint", "def main() -> i32 {\n return 1 / 0\n}\n");

    let outcome = compile(&root, &DriverConfig::default());

    assert!(!outcome.success);
    assert!(has_code(&outcome, "ERR_DIVISION_BY_ZERO"), "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn duplicate_test_name_in_one_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        &dir,
        "main.flint",
        "def main() -> i32 {\n return 0\n}\n\ntest \"dup\" {\n}\n\ntest \"dup\" {\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(!outcome.success);
    assert!(has_code(&outcome, "ERR_DUPLICATE_TEST_NAME"), "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn cyclic_imports_still_compile() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "b.flint", "import \"a.flint\"\ndef b_fn() -> i32 {\n return 0\n}\n");
    let root = write_file(&dir, "a.flint", "import \"b.flint\"\ndef main() -> i32 {\n return b_fn()\n}\n");

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
    assert_eq!(outcome.files.len(), 2);
}

#[test]
fn no_test_flag_skips_parsing_test_bodies() {
    // `frobnicate` is never defined anywhere in the compile unit; if this
    // test body were parsed, the call would fail to resolve. With
    // `retain_tests: false` the body is dropped before pass-2 and never
    // parsed, so the file still compiles cleanly.
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        &dir,
        "main.flint",
        "def main() -> i32 {\n return 0\n}\n\ntest \"unreachable\" {\n frobnicate()\n}\n",
    );

    let config = DriverConfig { retain_tests: false, ..DriverConfig::default() };
    let outcome = compile(&root, &config);

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn dump_namespace_lists_definition_names() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(&dir, "main.flint", "def main() -> i32 {\n return 0\n}\n");

    let config = DriverConfig { dump_namespace: true, ..DriverConfig::default() };
    let outcome = compile(&root, &config);

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
    let dump = outcome.namespace_dump.expect("namespace dump requested");
    assert!(dump.contains("main"));
}

#[test]
fn non_exhaustive_switch_over_enum_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(
        &dir,
        "main.flint",
        "enum Color {\n Red,\n Green,\n Blue\n}\n\ndef main() -> i32 {\n c := Red\n switch c {\n Red -> {\n }\n }\n return 0\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(!outcome.success);
    assert!(has_code(&outcome, "ERR_NON_EXHAUSTIVE_SWITCH"), "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn break_outside_loop_is_rejected_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = write_file(&dir, "main.flint", "def main() -> i32 {\n break\n return 0\n}\n");

    let outcome = compile(&root, &DriverConfig::default());

    assert!(!outcome.success);
    assert!(has_code(&outcome, "ERR_BREAK_OUTSIDE_LOOP"), "diagnostics: {:?}", outcome.diagnostics);
}

#[test]
fn every_resolved_file_gets_its_own_namespace_after_global_pass1() {
    // Global pass-1 finishes over the whole compile unit before any
    // file's pass-2 runs, so every file the resolver reached has a
    // populated namespace by the time `compile` returns.
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir, "lib.flint", "def add(a: i32, b: i32) -> i32 {\n return a + b\n}\n");
    let root = write_file(
        &dir,
        "main.flint",
        "import \"lib.flint\"\ndef main() -> i32 {\n return add(1, 2)\n}\n",
    );

    let outcome = compile(&root, &DriverConfig::default());

    assert!(outcome.success, "diagnostics: {:?}", outcome.diagnostics);
    assert_eq!(outcome.namespaces.len(), 2);
    for namespace in outcome.namespaces.values() {
        assert!(namespace.definition_count() > 0);
    }
}

#[test]
fn two_pass_resolution_matches_single_pass_order_when_nothing_forward_references() {
    // A helper defined before its use-site needs no forward reference, so
    // the two-pass scheme's pass-1/pass-2 split resolves the call
    // identically to a layout with no forward reference at all. Swapping
    // `helper`'s definition to *after* `main` forces pass-1 to have
    // already registered it before pass-2 parses `main`'s body; both
    // orderings must still compile to the same resolved call.
    let dir = tempfile::tempdir().unwrap();
    let helper_first = write_file(
        &dir,
        "helper_first.flint",
        "def helper() -> i32 {\n return 41\n}\n\ndef main() -> i32 {\n return helper() + 1\n}\n",
    );
    let helper_after = write_file(
        &dir,
        "helper_after.flint",
        "def main() -> i32 {\n return helper() + 1\n}\n\ndef helper() -> i32 {\n return 41\n}\n",
    );

    let before = compile(&helper_first, &DriverConfig::default());
    let after = compile(&helper_after, &DriverConfig::default());

    assert!(before.success, "diagnostics: {:?}", before.diagnostics);
    assert!(after.success, "diagnostics: {:?}", after.diagnostics);

    let returned_expr = |outcome: &flintfront::driver::CompileOutcome| -> String {
        use flintfront::ast::definitions::DefinitionKind;
        use flintfront::ast::statements::StatementKind;
        let file = outcome.files.values().next().unwrap();
        for def in &file.definitions {
            if let DefinitionKind::Function(f) = def.as_ref() {
                if f.name == "main" {
                    let scope = f.scope().expect("main has a parsed body");
                    match &scope.body.last().expect("non-empty body").kind {
                        StatementKind::Return { values } => return format!("{:?}", values[0].kind),
                        other => panic!("expected Return, got {other:?}"),
                    }
                }
            }
        }
        panic!("no main function found");
    };

    assert_eq!(returned_expr(&before), returned_expr(&after));
}
