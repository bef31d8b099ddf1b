//! Filesystem search for a named executable — PATH probe and directory scan.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Look the executable up via the host's standard PATH mechanism.
/// Returns the first match per standard lookup order, or None.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Recursively collect every executable regular file named exactly `name`
/// under `root`. A missing root is not an error — it yields the empty set,
/// the same as a root with no hits.
///
/// Symlinks are followed; entries are deduplicated by canonical path so a
/// link cycle or a duplicate mount cannot produce the same binary twice.
/// The result keeps the paths as walked — a release published as a symlink
/// (`EF5LatestRelease -> ef5-v1.2/`) must keep its marker in the path the
/// selection policy sees — and is sorted so downstream tie-breaking is
/// deterministic.
pub fn scan_directory(root: &Path, name: &str) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut hits: BTreeSet<PathBuf> = BTreeSet::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str() != Some(name) {
            continue;
        }
        let executable = entry
            .metadata()
            .map(|md| is_executable(&md))
            .unwrap_or(false);
        if !executable {
            continue;
        }
        // Canonical path collapses symlinked routes to the same file; the
        // as-walked path is what goes into the result.
        if let Ok(canonical) = std::fs::canonicalize(entry.path()) {
            if seen.insert(canonical) {
                hits.insert(entry.path().to_path_buf());
            }
        }
    }

    hits.into_iter().collect()
}

#[cfg(unix)]
fn is_executable(md: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    md.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_md: &std::fs::Metadata) -> bool {
    true
}
