//! Persistence for the project state file (`.bmt.json`): which mods have
//! been discovered, which the user has chosen to include, and when the
//! project was last scanned.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const STATE_FILE_NAME: &str = ".bmt.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiscoveredMod {
    pub name: String,
    #[serde(rename = "manifestPath")]
    pub manifest_path: PathBuf,
    pub included: bool,
    #[serde(rename = "discoveredAt")]
    pub discovered_at: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProjectState {
    #[serde(rename = "rootPath")]
    pub root_path: PathBuf,
    #[serde(rename = "discoveredMods")]
    pub discovered_mods: Vec<DiscoveredMod>,
    #[serde(rename = "lastScanMilliseconds")]
    pub last_scan_milliseconds: u64,
}

impl ProjectState {
    pub fn new(root_path: PathBuf) -> ProjectState {
        ProjectState { root_path, discovered_mods: Vec::new(), last_scan_milliseconds: 0 }
    }
}

/// Whether `dir` contains a project, distinct from whether the state file
/// is readable — callers need both answers (§6/§7: absence vs malformed).
#[derive(Debug)]
pub enum LoadError {
    NotAProject,
    Malformed { path: PathBuf, source: serde_json::Error },
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotAProject => write!(f, "not a bmt project (no {STATE_FILE_NAME} found)"),
            LoadError::Malformed { path, source } => {
                write!(f, "{}: malformed project state: {}", path.display(), source)
            }
            LoadError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::NotAProject => None,
            LoadError::Malformed { source, .. } => Some(source),
            LoadError::Io { source, .. } => Some(source),
        }
    }
}

pub fn state_path(project_root: &Path) -> PathBuf {
    project_root.join(STATE_FILE_NAME)
}

pub fn load(project_root: &Path) -> Result<ProjectState, LoadError> {
    let path = state_path(project_root);
    if !path.exists() {
        return Err(LoadError::NotAProject);
    }
    let bytes = fs::read(&path).map_err(|source| LoadError::Io { path: path.clone(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Malformed { path, source })
}

pub fn save(project_root: &Path, state: &ProjectState) -> Result<(), LoadError> {
    let path = state_path(project_root);
    let bytes = serde_json::to_vec_pretty(state)
        .map_err(|source| LoadError::Malformed { path: path.clone(), source })?;
    fs::write(&path, bytes).map_err(|source| LoadError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let mut state = ProjectState::new(PathBuf::from("/project"));
        state.discovered_mods.push(DiscoveredMod {
            name: "Example Mod".to_string(),
            manifest_path: PathBuf::from("/project/mods/example/manifest.json"),
            included: true,
            discovered_at: 1_700_000_000_000,
        });
        state.last_scan_milliseconds = 1_700_000_000_500;

        let json = serde_json::to_string(&state).unwrap();
        let parsed: ProjectState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
        assert!(json.contains("\"rootPath\""));
        assert!(json.contains("\"discoveredMods\""));
        assert!(json.contains("\"lastScanMilliseconds\""));
    }

    #[test]
    fn malformed_state_is_distinguished_from_absent() {
        let dir = std::env::temp_dir().join(format!("bmt-state-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STATE_FILE_NAME), b"{ not json").unwrap();
        let err = load(&dir).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn absent_state_is_not_a_project() {
        let dir = std::env::temp_dir().join(format!("bmt-state-test-absent-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let err = load(&dir).unwrap_err();
        assert!(matches!(err, LoadError::NotAProject));
        let _ = fs::remove_dir_all(&dir);
    }
}
