/*!
A pull-based, single-threaded, depth-first traverser. Directories the
oracle reports as ignored are pruned — never listed, never recursed into —
so an ignored subtree costs one `metadata` check and nothing more.
*/

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::oracle::{IgnoreOracle, IgnoreResult};

/// One entry yielded by the traverser — spec §3's `(absolute_path,
/// relative_path_from_root, is_directory, ignore_result)` record.
#[derive(Debug, Clone)]
pub struct FilesystemEntry {
    pub path: PathBuf,
    pub relative_path: String,
    pub is_directory: bool,
    pub ignore_result: IgnoreResult,
}

struct Frame {
    children: std::vec::IntoIter<PathBuf>,
}

/// Streams [`FilesystemEntry`] values in depth-first order starting from the
/// oracle's root. Does not allocate the whole tree up front — each call to
/// `next` does at most one directory listing.
pub struct Walker {
    oracle: Rc<IgnoreOracle>,
    stack: Vec<Frame>,
    visited: std::collections::HashSet<PathBuf>,
    include_ignored: bool,
}

impl Walker {
    pub fn new(oracle: Rc<IgnoreOracle>) -> Walker {
        let root = oracle.root().to_path_buf();
        let children = match oracle_list(&oracle, &root) {
            Ok(children) => children,
            Err(_) => Vec::new(),
        };
        Walker {
            oracle,
            stack: vec![Frame { children: children.into_iter() }],
            visited: std::collections::HashSet::new(),
            include_ignored: true,
        }
    }

    /// When set, ignored files are skipped entirely rather than yielded with
    /// `is_ignored: true`. Ignored directories are always pruned either way.
    pub fn include_ignored(mut self, include: bool) -> Walker {
        self.include_ignored = include;
        self
    }

    fn canonical_cycle_guard(&mut self, path: &Path) -> bool {
        let canonical = self.oracle.canonicalize(path);
        !self.visited.insert(canonical)
    }
}

fn oracle_list(oracle: &IgnoreOracle, dir: &Path) -> Result<Vec<PathBuf>, crate::error::Error> {
    oracle.list_dir(dir)
}

impl Iterator for Walker {
    type Item = FilesystemEntry;

    fn next(&mut self) -> Option<FilesystemEntry> {
        loop {
            let frame = self.stack.last_mut()?;
            let next_path = match frame.children.next() {
                Some(p) => p,
                None => {
                    self.stack.pop();
                    continue;
                }
            };

            if self.canonical_cycle_guard(&next_path) {
                continue;
            }

            let is_directory = self.oracle.is_directory(&next_path);
            let result = self.oracle.is_ignored(&next_path, is_directory);
            let relative_path =
                crate::relative_path::to_relative_string(self.oracle.root(), &next_path);

            if is_directory {
                if !result.is_ignored {
                    let children = oracle_list(&self.oracle, &next_path).unwrap_or_default();
                    self.stack.push(Frame { children: children.into_iter() });
                }
                if result.is_ignored && !self.include_ignored {
                    continue;
                }
                return Some(FilesystemEntry {
                    path: next_path,
                    relative_path,
                    is_directory: true,
                    ignore_result: result,
                });
            }

            if result.is_ignored && !self.include_ignored {
                continue;
            }
            return Some(FilesystemEntry {
                path: next_path,
                relative_path,
                is_directory: false,
                ignore_result: result,
            });
        }
    }
}

/// Convenience: every non-ignored file path under the oracle's root.
pub fn tracked_files(oracle: Rc<IgnoreOracle>) -> impl Iterator<Item = PathBuf> {
    Walker::new(oracle)
        .include_ignored(false)
        .filter(|e| !e.is_directory)
        .map(|e| e.path)
}

/// Convenience: every ignored path (file or directory) under the oracle's
/// root, in discovery order.
pub fn ignored_files(oracle: Rc<IgnoreOracle>) -> impl Iterator<Item = PathBuf> {
    Walker::new(oracle).filter(|e| e.ignore_result.is_ignored).map(|e| e.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{Filesystem, MemoryFilesystemBuilder};
    use crate::level::LevelStore;
    use std::path::PathBuf;

    fn oracle_over(root: &Path, fs: impl Filesystem + 'static) -> Rc<IgnoreOracle> {
        let fs: Rc<dyn Filesystem> = Rc::new(fs);
        let levels = LevelStore::new(Rc::clone(&fs), root.to_path_buf(), vec![], false);
        Rc::new(IgnoreOracle::new(fs, levels))
    }

    #[test]
    fn prunes_ignored_directories_without_descending() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .file("/project/.gitignore", b"build/\n")
            .dir("/project/build")
            .file("/project/build/out.txt", b"x")
            .dir("/project/build/nested")
            .file("/project/build/nested/deep.txt", b"x")
            .dir("/project/src")
            .file("/project/src/main.rs", b"fn main() {}")
            .build();
        let oracle = oracle_over(&root, fs);
        let tracked: Vec<PathBuf> = tracked_files(Rc::clone(&oracle)).collect();
        assert!(tracked.contains(&root.join("src/main.rs")));
        assert!(!tracked.iter().any(|p| p.starts_with(root.join("build"))));
    }

    #[test]
    fn yields_all_files_when_nothing_ignored() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .file("/project/a.json", b"{}")
            .dir("/project/sub")
            .file("/project/sub/b.json", b"{}")
            .build();
        let oracle = oracle_over(&root, fs);
        let tracked: Vec<PathBuf> = tracked_files(oracle).collect();
        assert!(tracked.contains(&root.join("a.json")));
        assert!(tracked.contains(&root.join("sub/b.json")));
    }

    #[test]
    fn entries_carry_relative_path_and_matched_pattern() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .file("/project/.gitignore", b"build/\n")
            .dir("/project/build")
            .file("/project/build/out.txt", b"x")
            .build();
        let oracle = oracle_over(&root, fs);
        let entries: Vec<FilesystemEntry> = Walker::new(oracle).collect();

        let build_entry = entries.iter().find(|e| e.path == root.join("build")).unwrap();
        assert_eq!(build_entry.relative_path, "build");
        assert!(build_entry.ignore_result.is_ignored);
        assert!(build_entry.ignore_result.matched.is_some());
    }
}
