//! Phase D: Driver.
//!
//! Orchestrates Resolver -> Parser pass-1 (all files) -> Parser pass-2
//! (all files) -> Analyzer (`spec.md` §5's ordering guarantee: "pass-2 of
//! a function may not begin until all pass-1 work globally has
//! completed"). Exposed as a library entry point (`compile`) so both the
//! CLI binary and, eventually, an LSP host can drive a compile run without
//! going through a process boundary.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::analyzer::Analyzer;
use crate::ast::file::FileNode;
use crate::diagnostics::{ColorChoice, Diagnostic, Severity};
use crate::hash::FileHash;
use crate::namespace::Namespace;
use crate::parser::Parser;
use crate::registries::Registries;
use crate::resolver::{self, ResolveConfig, ResolverError};

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// `--parallel` / `--no-parallel`: drives both resolver expansion and
    /// per-file pass-1/pass-2 work through `rayon`.
    pub parallel: bool,
    /// `--minimal-tree`: Resolver follows only aliased imports past the
    /// root's direct dependencies.
    pub minimal_tree: bool,
    /// `--max-depth=N`: Resolver depth cap.
    pub max_depth: Option<usize>,
    /// `--test`: retain and parse the `open_tests` list.
    pub retain_tests: bool,
    pub color: ColorChoice,
    pub dump_namespace: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            minimal_tree: false,
            max_depth: None,
            retain_tests: true,
            color: ColorChoice::Auto,
            dump_namespace: false,
        }
    }
}

/// Result of one compile run: whether it succeeded, every diagnostic
/// raised along the way, and (when successful) the frozen per-file ASTs
/// and namespaces for a downstream consumer (code generator, LSP, tests).
pub struct CompileOutcome {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub files: HashMap<FileHash, FileNode>,
    pub namespaces: HashMap<FileHash, Namespace>,
    pub namespace_dump: Option<String>,
}

pub fn compile(root_path: &Path, config: &DriverConfig) -> CompileOutcome {
    let resolve_config = ResolveConfig { minimal_tree: config.minimal_tree, max_depth: config.max_depth };

    let (graph, sources) = match resolver::resolve(root_path, resolve_config) {
        Ok(v) => v,
        Err(err) => {
            return CompileOutcome {
                success: false,
                diagnostics: vec![resolver_diagnostic(root_path, &err)],
                files: HashMap::new(),
                namespaces: HashMap::new(),
                namespace_dump: None,
            };
        }
    };

    let registries = Registries::new();
    let namespaces: HashMap<FileHash, Namespace> = sources.keys().map(|hash| (*hash, Namespace::new(*hash))).collect();

    let file_entries: Vec<(FileHash, crate::resolver::FileSource)> = sources.into_iter().collect();

    let pass1_outcomes: Vec<Pass1Outcome> = if config.parallel {
        file_entries.into_par_iter().map(|entry| run_pass1(entry, &namespaces, &registries)).collect()
    } else {
        file_entries.into_iter().map(|entry| run_pass1(entry, &namespaces, &registries)).collect()
    };

    let mut diagnostics = Vec::new();
    let mut pre_files = HashMap::new();
    for outcome in pass1_outcomes {
        match outcome.result {
            Ok(pre) => {
                pre_files.insert(outcome.hash, pre);
            }
            Err(err) => diagnostics.push(parser_diagnostic(&outcome.file_name, &outcome.text, &err)),
        }
    }

    if !diagnostics.is_empty() {
        return CompileOutcome { success: false, diagnostics, files: HashMap::new(), namespaces, namespace_dump: None };
    }

    let pre_entries: Vec<(FileHash, String, String, crate::ast::file::PreFileNode)> = pre_files
        .into_iter()
        .map(|(hash, pre)| {
            let node = graph.nodes.get(&hash).expect("every resolved file has a DepNode");
            let file_name = node.path.display().to_string();
            (hash, file_name, String::new(), pre)
        })
        .collect();

    let pass2_outcomes: Vec<(FileHash, String, Result<FileNode, crate::parser::ParserError>)> = if config.parallel {
        pre_entries
            .into_par_iter()
            .map(|(hash, file_name, _text, pre)| {
                let (hash, result) = run_pass2(hash, file_name.clone(), &namespaces, &registries, pre, config.retain_tests);
                (hash, file_name, result)
            })
            .collect()
    } else {
        pre_entries
            .into_iter()
            .map(|(hash, file_name, _text, pre)| {
                let (hash, result) = run_pass2(hash, file_name.clone(), &namespaces, &registries, pre, config.retain_tests);
                (hash, file_name, result)
            })
            .collect()
    };

    let mut files = HashMap::new();
    for (hash, file_name, result) in pass2_outcomes {
        match result {
            Ok(file) => {
                files.insert(hash, file);
            }
            Err(err) => diagnostics.push(parser_diagnostic(&file_name, "", &err)),
        }
    }

    if !diagnostics.is_empty() {
        return CompileOutcome { success: false, diagnostics, files, namespaces, namespace_dump: None };
    }

    let analyze_errors: Vec<(FileHash, Vec<crate::analyzer::AnalyzeError>)> = if config.parallel {
        files
            .par_iter()
            .map(|(hash, file)| {
                let namespace = namespaces.get(hash).expect("namespace exists for every parsed file");
                let analyzer = Analyzer::new(namespace, &registries);
                (*hash, analyzer.analyze_file(file))
            })
            .collect()
    } else {
        files
            .iter()
            .map(|(hash, file)| {
                let namespace = namespaces.get(hash).expect("namespace exists for every parsed file");
                let analyzer = Analyzer::new(namespace, &registries);
                (*hash, analyzer.analyze_file(file))
            })
            .collect()
    };

    for (hash, errors) in analyze_errors {
        let file_name = graph.nodes.get(&hash).map(|n| n.path.display().to_string()).unwrap_or_default();
        for err in errors {
            diagnostics.push(analyze_diagnostic(&file_name, &err));
        }
    }

    let namespace_dump = if config.dump_namespace { Some(dump_namespaces(&namespaces, &graph, &registries)) } else { None };

    registries.clear();

    CompileOutcome { success: diagnostics.is_empty(), diagnostics, files, namespaces, namespace_dump }
}

struct Pass1Outcome {
    hash: FileHash,
    file_name: String,
    text: String,
    result: Result<crate::ast::file::PreFileNode, crate::parser::ParserError>,
}

fn run_pass1(entry: (FileHash, crate::resolver::FileSource), namespaces: &HashMap<FileHash, Namespace>, registries: &Registries) -> Pass1Outcome {
    let (hash, source) = entry;
    let namespace = namespaces.get(&hash).expect("namespace exists for every resolved file");
    let file_name = source.identity.path.display().to_string();
    let parser = Parser::new(hash, file_name.clone(), namespace, registries);
    let result = parser.pass1(source.tokens);
    Pass1Outcome { hash, file_name, text: source.text, result }
}

fn run_pass2(
    hash: FileHash,
    file_name: String,
    namespaces: &HashMap<FileHash, Namespace>,
    registries: &Registries,
    mut pre: crate::ast::file::PreFileNode,
    retain_tests: bool,
) -> (FileHash, Result<FileNode, crate::parser::ParserError>) {
    // `--no-test`: drop stashed test bodies before pass-2 so they are
    // never parsed, matching `spec.md` §6's "`--test`: parse and retain
    // the `open_tests` list for pass-2" (their absence is the `--test`-off
    // behavior, not a separate code path through the parser).
    if !retain_tests {
        pre.open_tests.clear();
    }
    let namespace = namespaces.get(&hash).expect("namespace exists for every resolved file");
    let parser = Parser::new(hash, file_name, namespace, registries);
    (hash, parser.pass2(pre))
}

fn resolver_diagnostic(root_path: &Path, err: &ResolverError) -> Diagnostic {
    let (file_name, position) = match err {
        ResolverError::Io { path, .. } => (path.display().to_string(), None),
        ResolverError::Lex { path, source } => (path.display().to_string(), Some(source.position())),
    };
    let code = match err {
        ResolverError::Io { .. } => "ERR_RESOLVE_IO",
        ResolverError::Lex { source, .. } => source.code(),
    };
    let (line, column) = position.map(|p| (p.line, p.column)).unwrap_or((0, 0));
    let _ = root_path;
    Diagnostic::new(Severity::Error, code, file_name, line, column, 1, err.to_string(), None)
}

fn parser_diagnostic(file_name: &str, text: &str, err: &crate::parser::ParserError) -> Diagnostic {
    let (line, column, length) = err.position().map(|p| (p.line, p.column, p.length)).unwrap_or((0, 0, 1));
    let source = if text.is_empty() { None } else { Some(text) };
    Diagnostic::new(Severity::Error, err.code(), file_name, line, column, length, err.to_string(), source)
}

fn analyze_diagnostic(file_name: &str, err: &crate::analyzer::AnalyzeError) -> Diagnostic {
    let p = err.position();
    Diagnostic::new(Severity::Error, err.code(), file_name, p.line, p.column, p.length, err.to_string(), None)
}

/// `--dump-namespace=json`'s payload: public symbol names and type
/// canonical strings per file, never the AST itself (`SPEC_FULL.md` §4.D:
/// "does not violate the 'no debug-printing of the AST' Non-goal").
fn dump_namespaces(
    namespaces: &HashMap<FileHash, Namespace>,
    graph: &crate::resolver::DependencyGraph,
    registries: &Registries,
) -> String {
    #[derive(serde::Serialize)]
    struct NamespaceDump {
        file: String,
        definitions: Vec<String>,
        imported_core_modules: Vec<String>,
        type_count: usize,
    }

    #[derive(serde::Serialize)]
    struct Dump {
        namespaces: Vec<NamespaceDump>,
        /// Every call-id allocated in this compile run, in parse order —
        /// `registries.call_ids_in_order()`, surfaced here so a consumer
        /// tooling a `--dump-namespace` run can cross-check call-site
        /// counts against its own instrumentation.
        call_ids: Vec<u64>,
    }

    let dumps: Vec<NamespaceDump> = namespaces
        .iter()
        .map(|(hash, namespace)| NamespaceDump {
            file: graph.nodes.get(hash).map(|n| n.path.display().to_string()).unwrap_or_default(),
            definitions: namespace.definition_names(),
            imported_core_modules: namespace.imported_core_modules().into_iter().map(|m| m.module).collect(),
            type_count: namespace.types.len(),
        })
        .collect();

    let dump = Dump { namespaces: dumps, call_ids: registries.call_ids_in_order() };
    serde_json::to_string_pretty(&dump).unwrap_or_else(|_| "{}".to_string())
}
