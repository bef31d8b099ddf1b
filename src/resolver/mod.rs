//! Executable discovery — locate the EF5 binary and pick one deterministically.
//!
//! PATH and HOME are never read inside the search or selection logic; the
//! caller passes the target name, the scan root, and the preference marker
//! explicitly, so the whole resolution is reproducible in tests.

pub mod search;
pub mod select;

pub use select::{ResolutionError, Selection, SelectionSource};

use std::path::PathBuf;

/// Default directory the pipeline installer unpacks EF5 into.
pub const DEFAULT_ROOT_DIR: &str = "EF5";

/// Release directories carry this marker in their path; it is a naming
/// convention of the EF5 distribution, not a version comparison.
pub const DEFAULT_PREFER: &str = "EF5LatestRelease";

/// Name of the hydrologic engine binary.
pub const DEFAULT_NAME: &str = "ef5";

/// One-shot executable resolution. Running it twice against an unchanged
/// filesystem yields the same selection.
#[derive(Debug, Clone)]
pub struct Resolver {
    pub name: String,
    pub root: PathBuf,
    pub prefer: String,
}

impl Resolver {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, prefer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            prefer: prefer.into(),
        }
    }

    /// Probe PATH, scan the fallback root, then apply the selection policy.
    pub fn resolve(&self) -> Result<Selection, ResolutionError> {
        let path_hit = search::find_on_path(&self.name);
        let candidates = search::scan_directory(&self.root, &self.name);
        select::select(&self.name, &self.root, path_hit, candidates, &self.prefer)
    }
}

/// `$HOME/EF5`, the fallback scan root when none is given on the command line.
pub fn default_search_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_ROOT_DIR))
}
