use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// An I/O failure encountered while reading the filesystem.
///
/// This is the only error type the core engine surfaces to callers. Per-line
/// gitignore problems, missing `.gitignore` files and list-directory
/// failures are all handled internally (logged and treated as empty) rather
/// than propagated — see the crate-level docs.
#[derive(Debug)]
pub struct Error {
    path: PathBuf,
    source: io::Error,
}

impl Error {
    pub fn new<P: AsRef<Path>>(path: P, source: io::Error) -> Error {
        Error { path: path.as_ref().to_path_buf(), source }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}
