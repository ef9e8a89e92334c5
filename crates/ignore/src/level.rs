/*!
The level store composes, for each directory, the ordered list of patterns
effective at that level: the parent level's patterns followed by whatever
`.gitignore` that directory itself contributes. Levels are computed lazily
and memoized for the lifetime of the engine (or until [`LevelStore::clear_cache`]).
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::fs::Filesystem;
use crate::pattern::{self, Pattern};

/// The cumulative set of patterns effective inside one directory.
#[derive(Debug)]
pub struct Level {
    directory: PathBuf,
    relative_directory: String,
    patterns: Vec<Rc<Pattern>>,
}

impl Level {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn relative_directory(&self) -> &str {
        &self.relative_directory
    }

    pub fn patterns(&self) -> &[Rc<Pattern>] {
        &self.patterns
    }

    /// Walks the patterns in order and lets the last match win. Returns
    /// whether `relative_path` is ignored and, if so, the pattern that
    /// decided it.
    pub fn is_ignored(
        &self,
        relative_path: &str,
        is_directory: bool,
    ) -> (bool, Option<Rc<Pattern>>) {
        let mut ignored = false;
        let mut matched = None;
        for p in &self.patterns {
            if p.matches(relative_path, is_directory) {
                ignored = !p.is_negation();
                matched = Some(Rc::clone(p));
            }
        }
        (ignored, matched)
    }
}

/// Lazily compiles and memoizes a [`Level`] per directory.
pub struct LevelStore {
    fs: Rc<dyn Filesystem>,
    root: PathBuf,
    exclude_patterns: Vec<Rc<Pattern>>,
    additional_patterns: Vec<Rc<Pattern>>,
    ignore_gitignore_files: bool,
    cache: RefCell<HashMap<PathBuf, Rc<Level>>>,
}

impl LevelStore {
    /// `additional_patterns` is the caller-supplied tail of the root pattern
    /// stack (§3): `.git/info/exclude` patterns are read from `root`
    /// unconditionally, then the root `.gitignore` is appended (unless
    /// `ignore_gitignore_files` is set), then `additional_patterns` last —
    /// in that order, per the root level's composition rule.
    pub fn new(
        fs: Rc<dyn Filesystem>,
        root: PathBuf,
        additional_patterns: Vec<Pattern>,
        ignore_gitignore_files: bool,
    ) -> LevelStore {
        let exclude_patterns = read_exclude_patterns(fs.as_ref(), &root);
        LevelStore {
            fs,
            root,
            exclude_patterns,
            additional_patterns: additional_patterns.into_iter().map(Rc::new).collect(),
            ignore_gitignore_files,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Returns the level effective inside directory `dir`, which must be
    /// `root` or a descendant of it.
    pub fn level_for(&self, dir: &Path) -> Rc<Level> {
        if let Some(level) = self.cache.borrow().get(dir) {
            return Rc::clone(level);
        }

        let mut patterns: Vec<Rc<Pattern>> = if dir == self.root {
            self.exclude_patterns.clone()
        } else {
            match dir.parent() {
                Some(parent) => self.level_for(parent).patterns().to_vec(),
                None => self.exclude_patterns.clone(),
            }
        };

        self.append_own_gitignore(&mut patterns, dir);

        if dir == self.root {
            patterns.extend(self.additional_patterns.iter().cloned());
        }

        let level = Rc::new(Level {
            directory: dir.to_path_buf(),
            relative_directory: crate::relative_path::to_relative_string(&self.root, dir),
            patterns,
        });
        self.cache.borrow_mut().insert(dir.to_path_buf(), Rc::clone(&level));
        level
    }

    /// Appends `dir/.gitignore`'s own patterns, unless the engine was told to
    /// skip gitignore files entirely.
    fn append_own_gitignore(&self, patterns: &mut Vec<Rc<Pattern>>, dir: &Path) {
        if self.ignore_gitignore_files {
            return;
        }
        let gitignore_path = dir.join(".gitignore");
        if !self.fs.exists(&gitignore_path) {
            return;
        }
        let relative_dir = crate::relative_path::to_relative_string(&self.root, dir);
        match self.fs.read_bytes(&gitignore_path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                let source = gitignore_path.display().to_string();
                for (i, line) in text.lines().enumerate() {
                    if let Some(p) =
                        pattern::compile(line, source.clone(), (i + 1) as u64, &relative_dir)
                    {
                        patterns.push(Rc::new(p));
                    }
                }
            }
            Err(err) => {
                log::warn!("could not read {}: {}", gitignore_path.display(), err);
            }
        }
    }
}

/// Reads and compiles `root/.git/info/exclude`, if present. Uses the same
/// grammar as `.gitignore` (spec §4.1), with an empty base directory since
/// the exclude file's patterns are always root-relative.
fn read_exclude_patterns(fs: &dyn Filesystem, root: &Path) -> Vec<Rc<Pattern>> {
    let exclude_path = root.join(".git").join("info").join("exclude");
    if !fs.exists(&exclude_path) {
        return Vec::new();
    }
    match fs.read_bytes(&exclude_path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let source = exclude_path.display().to_string();
            text.lines()
                .enumerate()
                .filter_map(|(i, line)| pattern::compile(line, source.clone(), (i + 1) as u64, ""))
                .map(Rc::new)
                .collect()
        }
        Err(err) => {
            log::warn!("could not read {}: {}", exclude_path.display(), err);
            Vec::new()
        }
    }
}
