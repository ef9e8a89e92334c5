/*!
A hierarchical, gitignore-conformant filesystem walker.

This crate implements a pattern compiler ([`pattern`]), a per-directory
level store ([`level`]), an ignore oracle that honors parent-directory
shadowing ([`oracle`]), a pull-based depth-first traverser ([`walk`]), and a
thin manifest-discovery pipeline layered on top ([`manifest`]). Every
filesystem read goes through the [`fs::Filesystem`] trait, which is backed
by the real OS in production and by an in-memory fake in tests.

The top-level [`Engine`] ties these together into the shape most callers
want: point it at a root directory, optionally add extra ignore patterns or
disable gitignore entirely, and ask it to discover manifests or stream raw
entries.
*/

pub mod error;
pub mod fs;
pub mod level;
pub mod manifest;
pub mod oracle;
pub mod pattern;
pub mod relative_path;
pub mod walk;

use std::path::PathBuf;
use std::rc::Rc;

pub use error::Error;
pub use fs::{Filesystem, MemoryFilesystem, MemoryFilesystemBuilder, Metadata, RealFilesystem};
pub use level::{Level, LevelStore};
pub use manifest::{discover_manifests, DiscoveredManifest, ManifestOracle};
pub use oracle::{IgnoreOracle, IgnoreResult};
pub use pattern::Pattern;
pub use walk::{ignored_files, tracked_files, FilesystemEntry, Walker};

/// Builds an [`Engine`] over a project root.
pub struct EngineBuilder {
    fs: Rc<dyn Filesystem>,
    root: PathBuf,
    ignore_gitignore_files: bool,
    additional_ignores: Vec<String>,
}

impl EngineBuilder {
    pub fn new(fs: Rc<dyn Filesystem>, root: PathBuf) -> EngineBuilder {
        EngineBuilder { fs, root, ignore_gitignore_files: false, additional_ignores: Vec::new() }
    }

    pub fn ignore_gitignore_files(mut self, yes: bool) -> EngineBuilder {
        self.ignore_gitignore_files = yes;
        self
    }

    pub fn additional_ignore(mut self, pattern: impl Into<String>) -> EngineBuilder {
        self.additional_ignores.push(pattern.into());
        self
    }

    pub fn build(self) -> Engine {
        let mut root_patterns = Vec::new();
        for (i, raw) in self.additional_ignores.iter().enumerate() {
            if let Some(p) = pattern::compile(raw, "<additional-ignores>", (i + 1) as u64, "") {
                root_patterns.push(p);
            }
        }
        let levels = LevelStore::new(
            Rc::clone(&self.fs),
            self.root,
            root_patterns,
            self.ignore_gitignore_files,
        );
        let oracle = Rc::new(IgnoreOracle::new(Rc::clone(&self.fs), levels));
        Engine { fs: self.fs, oracle }
    }
}

/// The engine a caller interacts with: a root directory, a filesystem, and
/// the ignore oracle built from them.
pub struct Engine {
    fs: Rc<dyn Filesystem>,
    oracle: Rc<IgnoreOracle>,
}

impl Engine {
    pub fn root(&self) -> &std::path::Path {
        self.oracle.root()
    }

    pub fn clear_cache(&self) {
        self.oracle.clear_cache();
    }

    pub fn walk(&self) -> Walker {
        Walker::new(Rc::clone(&self.oracle))
    }

    pub fn tracked_files(&self) -> impl Iterator<Item = PathBuf> {
        tracked_files(Rc::clone(&self.oracle))
    }

    pub fn ignored_files(&self) -> impl Iterator<Item = PathBuf> {
        ignored_files(Rc::clone(&self.oracle))
    }

    pub fn filesystem(&self) -> &Rc<dyn Filesystem> {
        &self.fs
    }
}
