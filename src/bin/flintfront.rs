//! Flint front-end CLI.
//!
//! A thin `clap`-derived wrapper around [`flintfront::driver::compile`],
//! mirroring the teacher's `src/bin/txxt.rs` split between argument
//! parsing/IO here and pure processing in the library (`spec.md` §6's
//! "Command surface ... specified for completeness, not the hard part").

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use flintfront::diagnostics::{self, ColorChoice};
use flintfront::driver::{self, DriverConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Flint compiler front end: lex, resolve, parse, analyze", long_about = None)]
struct Args {
    /// Root source file to compile.
    path: PathBuf,

    /// Drive resolver expansion and pass-2 body parsing through a worker
    /// pool sized to logical cores (`spec.md` §6 `--parallel`).
    #[arg(long, default_value_t = true, overrides_with = "no_parallel")]
    parallel: bool,

    /// Disable `--parallel`; runs every phase on the calling thread.
    #[arg(long)]
    no_parallel: bool,

    /// Resolver follows only aliased imports past the root's direct
    /// dependencies (`spec.md` §6 `--minimal-tree`; LSP single-document
    /// mode).
    #[arg(long)]
    minimal_tree: bool,

    /// Resolver depth cap (`spec.md` §6 `--max-depth=N`).
    #[arg(long)]
    max_depth: Option<usize>,

    /// Parse and retain `test` bodies for pass-2 (`spec.md` §6 `--test`).
    #[arg(long, default_value_t = true, overrides_with = "no_test")]
    test: bool,

    /// Disable `--test`.
    #[arg(long)]
    no_test: bool,

    /// Whether diagnostics are colored (ambient, `SPEC_FULL.md` §4.D).
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,

    /// Dump the namespace map's public symbol names and type canonical
    /// strings as JSON instead of (or alongside) diagnostics (ambient,
    /// `SPEC_FULL.md` §4.D — not an AST debug-printer).
    #[arg(long)]
    dump_namespace: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(value: ColorArg) -> Self {
        match value {
            ColorArg::Auto => ColorChoice::Auto,
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = DriverConfig {
        parallel: args.parallel && !args.no_parallel,
        minimal_tree: args.minimal_tree,
        max_depth: args.max_depth,
        retain_tests: args.test && !args.no_test,
        color: args.color.into(),
        dump_namespace: args.dump_namespace,
    };

    let outcome = driver::compile(&args.path, &config);

    if let Some(dump) = &outcome.namespace_dump {
        println!("{dump}");
    }

    let has_errors = match diagnostics::render_terminal(&outcome.diagnostics, config.color) {
        Ok(has_errors) => has_errors,
        Err(err) => {
            eprintln!("failed to render diagnostics: {err}");
            return ExitCode::FAILURE;
        }
    };

    if has_errors || !outcome.success {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
