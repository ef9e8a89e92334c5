//! Wires the CLI's discovery options to the core crate's manifest pipeline
//! using the real filesystem.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use bmt_ignore::{discover_manifests, DiscoveredManifest, Filesystem, RealFilesystem};

use crate::manifest_schema::{BmtManifestOracle, ModManifest};
use crate::state::DiscoveredMod;

pub struct DiscoveryReport {
    pub mods: Vec<DiscoveredMod>,
    /// Epoch ms of this scan (spec §6's `lastScanMilliseconds`), not a
    /// duration — a scan's wall-clock cost isn't part of the persisted state.
    pub scanned_at_milliseconds: u64,
}

pub fn run(project_root: PathBuf, no_gitignore: bool, ignore_patterns: &[String]) -> DiscoveryReport {
    let fs: Rc<dyn Filesystem> = Rc::new(RealFilesystem::new());
    let oracle = BmtManifestOracle { strict: true };

    let respect_gitignore = !no_gitignore;
    let results: Vec<DiscoveredManifest<ModManifest>> =
        discover_manifests(fs, project_root, respect_gitignore, ignore_patterns, &oracle);

    let now_millis = epoch_millis(SystemTime::now());
    let mods = results
        .into_iter()
        .map(|found| DiscoveredMod {
            name: found.metadata.name,
            manifest_path: found.path,
            included: true,
            discovered_at: now_millis,
        })
        .collect();

    DiscoveryReport { mods, scanned_at_milliseconds: now_millis }
}

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanned_at_is_an_epoch_timestamp_not_a_duration() {
        let dir = std::env::temp_dir().join(format!("bmt-discover-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let before = epoch_millis(SystemTime::now());
        let report = run(dir.clone(), false, &[]);
        let after = epoch_millis(SystemTime::now());

        // A scan duration would be single-digit ms; an epoch timestamp is
        // a ~13-digit value bracketed by the calls around it.
        assert!(report.scanned_at_milliseconds >= before);
        assert!(report.scanned_at_milliseconds <= after);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
