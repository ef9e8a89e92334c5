/*!
The ignore oracle answers one question: is this path ignored? It composes
the level store's per-directory pattern match with the parent-directory
shadow rule — a path under an ignored directory is ignored regardless of
what its own patterns say.
*/

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::fs::Filesystem;
use crate::level::{Level, LevelStore};
use crate::pattern::Pattern;

/// The result of an ignore check: whether the path is ignored, and if so,
/// the pattern and the level that decided it. `matched`/`level` are `None`
/// when the path is ignored purely because an ancestor directory is ignored
/// (the shadow rule), not because of its own level's patterns.
#[derive(Debug, Clone)]
pub struct IgnoreResult {
    pub is_ignored: bool,
    pub matched: Option<Rc<Pattern>>,
    pub level: Option<Rc<Level>>,
}

impl IgnoreResult {
    fn not_ignored() -> IgnoreResult {
        IgnoreResult { is_ignored: false, matched: None, level: None }
    }

    fn shadowed() -> IgnoreResult {
        IgnoreResult { is_ignored: true, matched: None, level: None }
    }

    fn matched(pattern: Rc<Pattern>, level: Rc<Level>) -> IgnoreResult {
        IgnoreResult { is_ignored: true, matched: Some(pattern), level: Some(level) }
    }
}

/// Answers ignore queries for absolute paths under a [`LevelStore`]'s root.
pub struct IgnoreOracle {
    fs: Rc<dyn Filesystem>,
    levels: LevelStore,
}

impl IgnoreOracle {
    pub fn new(fs: Rc<dyn Filesystem>, levels: LevelStore) -> IgnoreOracle {
        IgnoreOracle { fs, levels }
    }

    pub fn root(&self) -> &Path {
        self.levels.root()
    }

    pub fn clear_cache(&self) {
        self.levels.clear_cache();
    }

    /// Whether `path` (absolute, under the store's root) is ignored.
    ///
    /// Checks the parent directory first: if it is shadowed, `path` is
    /// ignored unconditionally, no matter what its own level says. This is a
    /// deliberate generalization of the one-level check implied by the
    /// walker's top-down pruning — recursing to the root makes the shadow
    /// rule hold for direct queries at any depth, not only for paths
    /// discovered by descending through the tree. See DESIGN.md.
    pub fn is_ignored(&self, path: &Path, is_directory: bool) -> IgnoreResult {
        let root = self.levels.root().to_path_buf();
        if path == root {
            return IgnoreResult::not_ignored();
        }

        if let Some(parent) = path.parent() {
            if parent != path && parent.starts_with(&root) && parent != root {
                if self.is_ignored(parent, true).is_ignored {
                    return IgnoreResult::shadowed();
                }
            }
        }

        let parent_dir = match path.parent() {
            Some(p) => p,
            None => return IgnoreResult::not_ignored(),
        };
        let level = self.levels.level_for(parent_dir);
        let relative = crate::relative_path::to_relative_string(&root, path);
        let (ignored, matched) = level.is_ignored(&relative, is_directory);
        if ignored {
            match matched {
                Some(p) => IgnoreResult::matched(p, level),
                None => IgnoreResult::shadowed(),
            }
        } else {
            IgnoreResult::not_ignored()
        }
    }

    pub fn is_directory(&self, path: &Path) -> bool {
        self.fs.metadata(path).map(|m| m.is_dir).unwrap_or(false)
    }

    /// Lists `dir`'s immediate children, logging and treating the directory
    /// as empty on a read failure rather than propagating it — a single
    /// unreadable subdirectory should not abort the whole traversal.
    pub fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, crate::error::Error> {
        match self.fs.list(dir) {
            Ok(children) => Ok(children),
            Err(err) => {
                log::warn!("could not list {}: {}", dir.display(), err);
                Err(err)
            }
        }
    }

    pub fn canonicalize(&self, path: &Path) -> PathBuf {
        self.fs.canonicalize(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFilesystemBuilder;
    use std::path::PathBuf;

    fn oracle() -> (IgnoreOracle, PathBuf) {
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
        let fs: Rc<dyn Filesystem> = Rc::new(fs);
        let levels = LevelStore::new(Rc::clone(&fs), root.clone(), vec![], false);
        (IgnoreOracle::new(fs, levels), root)
    }

    #[test]
    fn direct_match_is_ignored() {
        let (oracle, root) = oracle();
        let result = oracle.is_ignored(&root.join("build"), true);
        assert!(result.is_ignored);
        assert!(result.matched.is_some());
    }

    #[test]
    fn deeply_nested_path_is_shadowed_without_descending() {
        let (oracle, root) = oracle();
        let result = oracle.is_ignored(&root.join("build/nested/deep.txt"), false);
        assert!(result.is_ignored);
        assert!(result.matched.is_none(), "shadowed paths carry no direct match");
    }

    #[test]
    fn sibling_outside_ignored_directory_is_untouched() {
        let (oracle, root) = oracle();
        let result = oracle.is_ignored(&root.join("src/main.rs"), false);
        assert!(!result.is_ignored);
    }
}
