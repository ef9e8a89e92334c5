/*!
The filesystem abstraction (C6). Every filesystem read in the core goes
through this trait, never directly through `std::fs` — which is what makes
the level store, oracle and traverser testable with an in-memory fake
instead of touching a real disk.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Metadata about a single filesystem entry. Intentionally smaller than
/// `std::fs::Metadata` — only what the engine needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub is_file: bool,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Everything the core touches on the filesystem.
pub trait Filesystem: fmt::Debug {
    fn exists(&self, path: &Path) -> bool;
    fn metadata(&self, path: &Path) -> Option<Metadata>;
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, Error>;
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, Error>;
    fn canonicalize(&self, path: &Path) -> PathBuf;
    fn working_directory(&self) -> PathBuf;
}

/// The host's real filesystem.
#[derive(Debug, Default)]
pub struct RealFilesystem;

impl RealFilesystem {
    pub fn new() -> RealFilesystem {
        RealFilesystem
    }
}

impl Filesystem for RealFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn metadata(&self, path: &Path) -> Option<Metadata> {
        let meta = fs::symlink_metadata(path).ok()?;
        if meta.file_type().is_symlink() {
            // Follow once to classify file vs directory; a dangling symlink
            // is treated as "not a directory" per spec's metadata-failure
            // policy.
            let followed = fs::metadata(path).ok();
            Some(Metadata {
                is_file: followed.as_ref().map(|m| m.is_file()).unwrap_or(false),
                is_dir: followed.as_ref().map(|m| m.is_dir()).unwrap_or(false),
                is_symlink: true,
            })
        } else {
            Some(Metadata {
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                is_symlink: false,
            })
        }
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, Error> {
        fs::read(path).map_err(|err| Error::new(path, err))
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let rd = fs::read_dir(dir).map_err(|err| Error::new(dir, err))?;
        let mut out = Vec::new();
        for entry in rd {
            let entry = entry.map_err(|err| Error::new(dir, err))?;
            out.push(entry.path());
        }
        Ok(out)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    fn working_directory(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[derive(Clone, Debug)]
enum MemoryEntry {
    Dir(Vec<PathBuf>),
    File(Vec<u8>),
}

/// An in-memory fake filesystem, for tests that exercise the level store,
/// oracle, traverser and manifest pipeline without touching the real disk.
#[derive(Debug)]
pub struct MemoryFilesystem {
    working_directory: PathBuf,
    entries: RefCell<HashMap<PathBuf, MemoryEntry>>,
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries.borrow().contains_key(path)
    }

    fn metadata(&self, path: &Path) -> Option<Metadata> {
        match self.entries.borrow().get(path)? {
            MemoryEntry::Dir(_) => Some(Metadata { is_file: false, is_dir: true, is_symlink: false }),
            MemoryEntry::File(_) => Some(Metadata { is_file: true, is_dir: false, is_symlink: false }),
        }
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, Error> {
        match self.entries.borrow().get(path) {
            Some(MemoryEntry::File(bytes)) => Ok(bytes.clone()),
            Some(MemoryEntry::Dir(_)) => Err(Error::new(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "is a directory"),
            )),
            None => Err(Error::new(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )),
        }
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, Error> {
        match self.entries.borrow().get(dir) {
            Some(MemoryEntry::Dir(children)) => Ok(children.clone()),
            Some(MemoryEntry::File(_)) => Err(Error::new(
                dir,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            )),
            None => Err(Error::new(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "no such directory"),
            )),
        }
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        normalize_lexically(path)
    }

    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Builds a [`MemoryFilesystem`] by registering directories and files.
/// Directory entries are listed in insertion order.
pub struct MemoryFilesystemBuilder {
    working_directory: PathBuf,
    entries: HashMap<PathBuf, MemoryEntry>,
}

impl MemoryFilesystemBuilder {
    pub fn new(working_directory: impl Into<PathBuf>) -> MemoryFilesystemBuilder {
        let working_directory = working_directory.into();
        let mut entries = HashMap::new();
        entries.insert(working_directory.clone(), MemoryEntry::Dir(Vec::new()));
        MemoryFilesystemBuilder { working_directory, entries }
    }

    fn ensure_dir(&mut self, path: &Path) {
        if !self.entries.contains_key(path) {
            self.entries.insert(path.to_path_buf(), MemoryEntry::Dir(Vec::new()));
        }
        if let Some(parent) = path.parent() {
            if parent != path {
                self.ensure_dir(&parent.to_path_buf());
                self.register_child(parent, path);
            }
        }
    }

    fn register_child(&mut self, parent: &Path, child: &Path) {
        if let Some(MemoryEntry::Dir(children)) = self.entries.get_mut(parent) {
            if !children.iter().any(|c| c == child) {
                children.push(child.to_path_buf());
            }
        }
    }

    pub fn dir(mut self, path: impl AsRef<Path>) -> MemoryFilesystemBuilder {
        let path = path.as_ref().to_path_buf();
        self.ensure_dir(&path);
        self
    }

    pub fn file(mut self, path: impl AsRef<Path>, contents: &[u8]) -> MemoryFilesystemBuilder {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.ensure_dir(&parent.to_path_buf());
            self.register_child(parent, &path);
        }
        self.entries.insert(path, MemoryEntry::File(contents.to_vec()));
        self
    }

    pub fn build(self) -> MemoryFilesystem {
        MemoryFilesystem {
            working_directory: self.working_directory,
            entries: RefCell::new(self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_registers_nested_children_in_insertion_order() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .file("/project/b.json", b"{}")
            .file("/project/a.json", b"{}")
            .build();
        let children = fs.list(&root).unwrap();
        assert_eq!(children, vec![root.join("b.json"), root.join("a.json")]);
    }

    #[test]
    fn file_metadata_reports_non_directory() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root).file("/project/a.json", b"{}").build();
        let meta = fs.metadata(&root.join("a.json")).unwrap();
        assert!(meta.is_file);
        assert!(!meta.is_dir);
    }

    #[test]
    fn missing_path_read_is_an_error() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root).build();
        assert!(fs.read_bytes(&root.join("missing.json")).is_err());
    }
}
