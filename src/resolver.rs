//! Phase R: Resolver.
//!
//! Discovers the file dependency graph by following `import "path"`
//! statements, starting from one root file, and reads + tokenizes every
//! file it reaches (`spec.md` §4.R). Runs before the Parser proper: import
//! discovery only needs each file's tokens, not a full pass-1 parse, so
//! the Resolver extracts import lines itself with a single linear scan
//! rather than standing up a `Namespace` per candidate file before it is
//! even known the file belongs in the compile unit.
//!
//! Cycles are tolerated (`spec.md` §4.R "cycle tolerance"): a file already
//! reached by an earlier edge is recorded as a back-edge on rediscovery
//! rather than re-queued, so `a.flint` importing `b.flint` importing
//! `a.flint` terminates. Expansion proceeds breadth-first in rounds; each
//! round's frontier is resolved in parallel via `rayon`
//! (`SPEC_FULL.md`'s adoption of `logos_core`'s parallel-round pattern —
//! the teacher's own resolver has no concurrency to generalize here).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::hash::{FileHash, FileIdentity};
use crate::lexer::{Keyword, LexError, Token, TokenKind};

#[derive(Debug, Clone)]
pub enum ResolverError {
    Io { path: PathBuf, message: String },
    Lex { path: PathBuf, source: LexError },
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverError::Io { path, message } => write!(f, "{}: {}", path.display(), message),
            ResolverError::Lex { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for ResolverError {}

/// One file's place in the dependency graph: the files it owns a forward
/// edge to (first discovery) plus the ones it merely re-references
/// (`back_edges`, already reached via some other path).
#[derive(Debug, Clone)]
pub struct DepNode {
    pub file: FileHash,
    pub path: PathBuf,
    pub forward_edges: Vec<FileHash>,
    pub back_edges: Vec<FileHash>,
}

/// One file's text and tokens, read and lexed once by the Resolver so the
/// Parser never has to touch the filesystem itself. The raw text is kept
/// alongside the tokens purely for diagnostics rendering (source-excerpt
/// underlining); the Parser only ever consumes `tokens`.
pub struct FileSource {
    pub identity: FileIdentity,
    pub text: String,
    pub tokens: Vec<Token>,
}

pub struct DependencyGraph {
    pub nodes: HashMap<FileHash, DepNode>,
    pub root: FileHash,
}

impl DependencyGraph {
    /// The graph's leaves: nodes whose only edges are back-edges, or that
    /// have no edges at all (`spec.md` §4.R). A cycle closes through a
    /// back-edge rather than a fresh node, so the node that discovers the
    /// cycle still counts as a leaf — it has nothing left to expand.
    pub fn tips(&self) -> Vec<FileHash> {
        self.nodes
            .values()
            .filter(|node| node.forward_edges.is_empty())
            .map(|node| node.file)
            .collect()
    }

    /// Every file reached, root first then discovery order — the file set
    /// the Parser must run pass-1 over before any file's pass-2 begins.
    pub fn files(&self) -> Vec<FileHash> {
        self.nodes.keys().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveConfig {
    /// LSP-style single-document mode (`spec.md` §4.R): stop recursing past
    /// the root's direct imports, except through an aliased import, which
    /// always keeps recursing — an alias is typically used qualified
    /// (`alias.member`), so its own members must resolve too.
    pub minimal_tree: bool,
    pub max_depth: Option<usize>,
}

pub fn resolve(
    root_path: &Path,
    config: ResolveConfig,
) -> Result<(DependencyGraph, HashMap<FileHash, FileSource>), ResolverError> {
    let root_identity = FileIdentity::new(root_path.to_path_buf());
    let root_hash = root_identity.hash;

    let mut nodes: HashMap<FileHash, DepNode> = HashMap::new();
    let mut sources: HashMap<FileHash, FileSource> = HashMap::new();
    let mut visited: HashSet<FileHash> = HashSet::new();
    visited.insert(root_hash);

    let mut frontier: Vec<(FileHash, PathBuf)> = vec![(root_hash, root_path.to_path_buf())];
    let mut depth = 0usize;

    while !frontier.is_empty() {
        if let Some(max) = config.max_depth {
            if depth > max {
                break;
            }
        }

        let expanded: Vec<Result<ExpandedFile, ResolverError>> =
            frontier.par_iter().map(|(hash, path)| expand_one(*hash, path)).collect();

        let mut next_frontier = Vec::new();
        for result in expanded {
            let expanded = result?;
            sources.insert(
                expanded.hash,
                FileSource {
                    identity: FileIdentity { hash: expanded.hash, path: expanded.path.clone() },
                    text: expanded.text,
                    tokens: expanded.tokens,
                },
            );

            let mut forward_edges = Vec::new();
            let mut back_edges = Vec::new();
            for edge in expanded.edges {
                if visited.contains(&edge.file) {
                    back_edges.push(edge.file);
                    continue;
                }
                visited.insert(edge.file);
                forward_edges.push(edge.file);

                let keep_recursing = !config.minimal_tree || depth == 0 || edge.is_aliased;
                if keep_recursing {
                    next_frontier.push((edge.file, edge.path));
                }
            }

            nodes.insert(
                expanded.hash,
                DepNode { file: expanded.hash, path: expanded.path, forward_edges, back_edges },
            );
        }

        frontier = next_frontier;
        depth += 1;
    }

    Ok((DependencyGraph { nodes, root: root_hash }, sources))
}

struct ImportEdge {
    file: FileHash,
    path: PathBuf,
    is_aliased: bool,
}

struct ExpandedFile {
    hash: FileHash,
    path: PathBuf,
    text: String,
    tokens: Vec<Token>,
    edges: Vec<ImportEdge>,
}

fn expand_one(hash: FileHash, path: &Path) -> Result<ExpandedFile, ResolverError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ResolverError::Io { path: path.to_path_buf(), message: e.to_string() })?;
    let tokens = crate::lexer::tokenize(&text, hash)
        .map_err(|source| ResolverError::Lex { path: path.to_path_buf(), source })?;

    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let edges = extract_file_imports(&tokens)
        .into_iter()
        .map(|(relative, is_aliased)| {
            let child_path = directory.join(relative);
            let child_identity = FileIdentity::new(child_path.clone());
            ImportEdge { file: child_identity.hash, path: child_path, is_aliased }
        })
        .collect();

    Ok(ExpandedFile { hash, path: path.to_path_buf(), text, tokens, edges })
}

/// Scans a token stream for `import "path"` / `import "path" as alias`
/// statements, ignoring `import <core-module>` (no file to resolve) and
/// everything else — the full grammar is the Parser's job, not the
/// Resolver's.
fn extract_file_imports(tokens: &[Token]) -> Vec<(String, bool)> {
    let mut imports = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if let TokenKind::Keyword(Keyword::Import) = &tokens[i].kind {
            if let Some(Token { kind: TokenKind::StrPart(path), .. }) = tokens.get(i + 1) {
                let is_aliased = matches!(
                    tokens.get(i + 2),
                    Some(Token { kind: TokenKind::Keyword(Keyword::As), .. })
                );
                imports.push((path.clone(), is_aliased));
            }
        }
        i += 1;
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn single_file_has_no_edges() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_file(&dir, "main.flint", "def main() {\n return\n}\n");
        let (graph, sources) = resolve(&root, ResolveConfig::default()).unwrap();
        assert_eq!(graph.files().len(), 1);
        assert_eq!(sources.len(), 1);
        // No edges at all still counts as a leaf.
        assert_eq!(graph.tips(), vec![graph.root]);
    }

    #[test]
    fn import_edge_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "lib.flint", "def helper() {\n return\n}\n");
        let root = write_file(&dir, "main.flint", "import \"lib.flint\"\ndef main() {\n return\n}\n");
        let (graph, sources) = resolve(&root, ResolveConfig::default()).unwrap();
        assert_eq!(graph.files().len(), 2);
        assert_eq!(sources.len(), 2);
        // `lib.flint` has no outgoing edges of its own, so it's the one leaf.
        assert_eq!(graph.tips().len(), 1);
        assert_ne!(graph.tips()[0], graph.root);
    }

    #[test]
    fn cyclic_imports_terminate() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "b.flint", "import \"a.flint\"\ndef b() {\n return\n}\n");
        let root = write_file(&dir, "a.flint", "import \"b.flint\"\ndef a() {\n return\n}\n");
        let (graph, _sources) = resolve(&root, ResolveConfig::default()).unwrap();
        assert_eq!(graph.files().len(), 2);
        let root_node = &graph.nodes[&graph.root];
        assert_eq!(root_node.forward_edges.len(), 1);
        // `b.flint`'s only edge back to `a.flint` is a back-edge, so it's
        // the graph's single leaf; `a.flint` itself still has a forward
        // edge and is not a tip.
        assert_eq!(graph.tips().len(), 1);
        assert_ne!(graph.tips()[0], graph.root);
    }

    #[test]
    fn mutually_importing_files_have_exactly_one_back_edge_and_one_tip() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "q.flint", "import \"p.flint\"\ndef q() {\n return\n}\n");
        let root = write_file(&dir, "p.flint", "import \"q.flint\"\ndef p() {\n return\n}\n");
        let (graph, _sources) = resolve(&root, ResolveConfig::default()).unwrap();

        assert_eq!(graph.files().len(), 2);
        let total_back_edges: usize = graph.nodes.values().map(|n| n.back_edges.len()).sum();
        assert_eq!(total_back_edges, 1);
        assert_eq!(graph.tips().len(), 1);
    }

    #[test]
    fn minimal_tree_stops_past_one_level_for_plain_imports() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir, "grandchild.flint", "def g() {\n return\n}\n");
        write_file(&dir, "child.flint", "import \"grandchild.flint\"\ndef c() {\n return\n}\n");
        let root = write_file(&dir, "main.flint", "import \"child.flint\"\ndef main() {\n return\n}\n");
        let (graph, _sources) = resolve(&root, ResolveConfig { minimal_tree: true, max_depth: None }).unwrap();
        // `child.flint` is discovered (direct import of the root) but its
        // own import of `grandchild.flint` is never expanded, so
        // `child.flint`'s forward edge points outside the graph and it
        // isn't a leaf either — neither node here is a tip.
        assert_eq!(graph.files().len(), 2);
        assert!(graph.tips().is_empty());
    }
}
