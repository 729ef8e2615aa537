//! File identity.
//!
//! A [`FileHash`] uniquely identifies a compilation unit for the lifetime of
//! one compile run. It is derived deterministically from a file's
//! canonicalized absolute path so that the same file, imported from two
//! different relative paths, resolves to the same identity.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash as StdHash, Hasher};
use std::path::{Path, PathBuf};

/// A stable 64-bit identity for a compilation unit.
///
/// Not a cryptographic hash: just deterministic and collision-unlikely
/// enough to key a process-wide map for the duration of a compile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct FileHash(u64);

impl FileHash {
    /// Computes the hash of an absolute path. The path is canonicalized
    /// first when possible so that `./a.flint` and `a.flint` (from the same
    /// directory) collapse to the same identity; if canonicalization fails
    /// (e.g. the file does not exist yet, as in some tests) the raw path is
    /// hashed instead.
    pub fn of_path(path: &Path) -> Self {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::of_canonical_path(&canonical)
    }

    /// Computes the hash of a path already known to be absolute and
    /// canonical. Exposed separately so callers that already canonicalized
    /// (e.g. the Resolver, which does this once per import) do not pay for
    /// a second file-system round trip.
    pub fn of_canonical_path(path: &Path) -> Self {
        let mut hasher = DefaultHasher::new();
        path.as_os_str().hash(&mut hasher);
        FileHash(hasher.finish())
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Pairs a [`FileHash`] with the path it was derived from, for diagnostics
/// and for the Resolver's `file_ids` table (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileIdentity {
    pub hash: FileHash,
    pub path: PathBuf,
}

impl FileIdentity {
    pub fn new(path: PathBuf) -> Self {
        let hash = FileHash::of_path(&path);
        Self { hash, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_canonical_path_same_hash() {
        let a = FileHash::of_canonical_path(Path::new("/tmp/a.flint"));
        let b = FileHash::of_canonical_path(Path::new("/tmp/a.flint"));
        assert_eq!(a, b);
    }

    #[test]
    fn different_paths_different_hash() {
        let a = FileHash::of_canonical_path(Path::new("/tmp/a.flint"));
        let b = FileHash::of_canonical_path(Path::new("/tmp/b.flint"));
        assert_ne!(a, b);
    }
}
