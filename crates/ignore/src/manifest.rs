/*!
The manifest pipeline (C5) is a thin consumer layered on top of the
traverser: filter to `.json` files, hand each one to a caller-supplied
parse-and-validate oracle, keep what comes back `Some`.
*/

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::fs::Filesystem;
use crate::level::LevelStore;
use crate::oracle::IgnoreOracle;
use crate::pattern;
use crate::walk::Walker;

/// A file that parsed and validated as a manifest.
#[derive(Debug, Clone)]
pub struct DiscoveredManifest<M> {
    pub path: PathBuf,
    pub metadata: M,
}

/// The typed oracle the core depends on but does not implement: read bytes,
/// decode them as the manifest schema, validate, and report `None` on any
/// failure at any stage. Concrete manifest schemas live outside this crate.
pub trait ManifestOracle<M> {
    fn parse_and_validate(&self, bytes: &[u8]) -> Option<M>;
}

const STATE_FILE_NAME: &str = ".bmt.json";
const GIT_DIR_PATTERN: &str = ".git/";

fn is_json_candidate(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };
    name.ends_with(".json") && name != STATE_FILE_NAME
}

/// Discovers manifests under `root`.
///
/// When `respect_gitignore` is true, or `additional_ignores` is non-empty, a
/// hierarchical engine is built with `.git/` and `.bmt.json` as base ignores
/// plus the caller's additional patterns, and `ignore_gitignore_files =
/// !respect_gitignore`. Otherwise discovery falls back to a legacy substring
/// / simple-glob filter over every path (see [`legacy_discover`]).
pub fn discover_manifests<M, O: ManifestOracle<M>>(
    fs: Rc<dyn Filesystem>,
    root: PathBuf,
    respect_gitignore: bool,
    additional_ignores: &[String],
    oracle: &O,
) -> Vec<DiscoveredManifest<M>> {
    if respect_gitignore || !additional_ignores.is_empty() {
        hierarchical_discover(fs, root, respect_gitignore, additional_ignores, oracle)
    } else {
        legacy_discover(fs.as_ref(), &root, oracle)
    }
}

fn hierarchical_discover<M, O: ManifestOracle<M>>(
    fs: Rc<dyn Filesystem>,
    root: PathBuf,
    respect_gitignore: bool,
    additional_ignores: &[String],
    oracle: &O,
) -> Vec<DiscoveredManifest<M>> {
    let mut root_patterns = Vec::new();
    for (i, base) in [GIT_DIR_PATTERN, STATE_FILE_NAME].into_iter().enumerate() {
        if let Some(p) = pattern::compile(base, "<base-ignores>", (i + 1) as u64, "") {
            root_patterns.push(p);
        }
    }
    for (i, raw) in additional_ignores.iter().enumerate() {
        if let Some(p) = pattern::compile(raw, "<additional-ignores>", (i + 1) as u64, "") {
            root_patterns.push(p);
        }
    }

    let read_fs = Rc::clone(&fs);
    let levels = LevelStore::new(Rc::clone(&fs), root, root_patterns, !respect_gitignore);
    let ignore_oracle = Rc::new(IgnoreOracle::new(fs, levels));

    let mut out = Vec::new();
    for entry in Walker::new(ignore_oracle).include_ignored(false) {
        if entry.is_directory {
            continue;
        }
        if !is_json_candidate(&entry.path) {
            continue;
        }
        if let Some(metadata) = read_bytes_via(read_fs.as_ref(), &entry.path, oracle) {
            out.push(DiscoveredManifest { path: entry.path, metadata });
        }
    }
    out
}

fn read_bytes_via<M, O: ManifestOracle<M>>(
    fs: &dyn Filesystem,
    path: &Path,
    oracle: &O,
) -> Option<M> {
    let bytes = fs.read_bytes(path).ok()?;
    oracle.parse_and_validate(&bytes)
}

/// The non-gitignore fallback: recursively list every path under `root` and
/// reject any whose string representation contains an ignore substring or
/// matches it as a simple glob. Retained only for "no gitignore respect and
/// no additional patterns"; prefer the hierarchical path otherwise. Base
/// ignores (`.git/`, `.bmt.json`) still apply here via [`legacy_matches`] —
/// the legacy path is a looser matcher, not an unfiltered one.
fn legacy_discover<M, O: ManifestOracle<M>>(
    fs: &dyn Filesystem,
    root: &Path,
    oracle: &O,
) -> Vec<DiscoveredManifest<M>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let children = match fs.list(&dir) {
            Ok(children) => children,
            Err(err) => {
                log::warn!("could not list {}: {}", dir.display(), err);
                continue;
            }
        };
        for child in children {
            let relative = crate::relative_path::to_relative_string(root, &child);
            if legacy_matches(&relative, ".git") || legacy_matches(&relative, STATE_FILE_NAME) {
                continue;
            }
            let is_dir = fs.metadata(&child).map(|m| m.is_dir).unwrap_or(false);
            if is_dir {
                stack.push(child);
                continue;
            }
            if !is_json_candidate(&child) {
                continue;
            }
            if let Some(metadata) = read_bytes_via(fs, &child, oracle) {
                out.push(DiscoveredManifest { path: child, metadata });
            }
        }
    }
    out
}

fn simple_glob_matches(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match (p.first(), t.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..]))
            }
            (Some(pc), Some(tc)) if pc == tc => helper(&p[1..], &t[1..]),
            _ => false,
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}

/// The legacy fallback's substring/glob policy, used by [`legacy_discover`]
/// to enforce base ignores; kept as a free function so it is independently
/// testable.
pub fn legacy_matches(path_str: &str, raw_pattern: &str) -> bool {
    path_str.contains(raw_pattern) || simple_glob_matches(raw_pattern, path_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFilesystemBuilder;

    /// A `"name"` key distinguishes a manifest-shaped JSON file from an
    /// unrelated one like `package.json`, the way a real schema's
    /// validation would.
    struct AlwaysAccept;
    impl ManifestOracle<String> for AlwaysAccept {
        fn parse_and_validate(&self, bytes: &[u8]) -> Option<String> {
            let text = std::str::from_utf8(bytes).ok()?;
            if text.trim_start().starts_with('{') && text.contains("\"name\"") {
                Some(text.to_string())
            } else {
                None
            }
        }
    }

    fn fixture() -> (Rc<dyn Filesystem>, PathBuf) {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .file("/project/.gitignore", b"temp/\n*.log\nnode_modules\n")
            .file("/project/.bmt.json", b"{}")
            .file("/project/package.json", b"{}")
            .dir("/project/mods/a")
            .file("/project/mods/a/manifest.json", b"{\"name\":\"a\"}")
            .dir("/project/plugins/b")
            .file("/project/plugins/b/manifest.json", b"{\"name\":\"b\"}")
            .dir("/project/broken")
            .file("/project/broken/manifest.json", b"{ broken json")
            .dir("/project/temp")
            .file("/project/temp/manifest.json", b"{\"name\":\"temp\"}")
            .build();
        (Rc::new(fs), root)
    }

    #[test]
    fn basic_discovery_with_gitignore_excludes_ignored_and_root_files() {
        let (fs, root) = fixture();
        let results = discover_manifests(fs, root.clone(), true, &[], &AlwaysAccept);
        let paths: Vec<&Path> = results.iter().map(|m| m.path.as_path()).collect();
        assert!(paths.contains(&root.join("mods/a/manifest.json").as_path()));
        assert!(paths.contains(&root.join("plugins/b/manifest.json").as_path()));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn disabling_gitignore_includes_temp_and_package_json_is_not_a_manifest_name() {
        let (fs, root) = fixture();
        let results = discover_manifests(fs, root.clone(), false, &[], &AlwaysAccept);
        let paths: Vec<&Path> = results.iter().map(|m| m.path.as_path()).collect();
        assert!(paths.contains(&root.join("temp/manifest.json").as_path()));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn additional_ignores_override_even_without_a_gitignore_file() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .dir("/project/allowed")
            .file("/project/allowed/manifest.json", b"{\"name\":\"allowed\"}")
            .dir("/project/custom_ignored")
            .file("/project/custom_ignored/manifest.json", b"{\"name\":\"x\"}")
            .build();
        let results = discover_manifests(
            Rc::new(fs),
            root.clone(),
            true,
            &["custom_ignored".to_string()],
            &AlwaysAccept,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, root.join("allowed/manifest.json"));
    }

    #[test]
    fn broken_json_yields_none_and_is_skipped() {
        let (fs, root) = fixture();
        let results = discover_manifests(fs, root, true, &[], &AlwaysAccept);
        assert!(!results.iter().any(|m| m.path.ends_with("broken/manifest.json")));
    }

    #[test]
    fn legacy_matches_supports_substring_and_star_glob() {
        assert!(legacy_matches("build/output.log", "build"));
        assert!(legacy_matches("node_modules/pkg/index.js", "node_*"));
        assert!(!legacy_matches("src/main.rs", "node_modules"));
    }

    #[test]
    fn legacy_discovery_still_excludes_base_ignores() {
        let root = PathBuf::from("/project");
        let fs = MemoryFilesystemBuilder::new(&root)
            .dir("/project/.git")
            .file("/project/.git/config.json", b"{\"name\":\"not-a-mod\"}")
            .file("/project/.bmt.json", b"{}")
            .dir("/project/mods/a")
            .file("/project/mods/a/manifest.json", b"{\"name\":\"a\"}")
            .build();
        let results = discover_manifests(Rc::new(fs), root.clone(), false, &[], &AlwaysAccept);
        let paths: Vec<&Path> = results.iter().map(|m| m.path.as_path()).collect();
        assert_eq!(paths, vec![root.join("mods/a/manifest.json").as_path()]);
    }
}
