//! Candidate selection policy.
//!
//! Precedence: a PATH hit always wins; a sole scan candidate is taken as-is;
//! among several candidates the first (sorted) one containing the preference
//! substring is chosen; otherwise there is no safe automatic choice and the
//! caller must configure the path manually.

use std::fmt;
use std::path::{Path, PathBuf};

/// How the selected path was arrived at. `PreferredCandidate` means an
/// automatic choice was made among ambiguous candidates and the caller
/// should say so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSource {
    PathLookup,
    SoleCandidate,
    PreferredCandidate,
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathLookup => write!(f, "PATH lookup"),
            Self::SoleCandidate => write!(f, "sole candidate"),
            Self::PreferredCandidate => write!(f, "preferred candidate"),
        }
    }
}

/// The resolved executable path. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub path: PathBuf,
    pub source: SelectionSource,
}

/// Why resolution failed. Every variant is a user-recoverable condition,
/// reported with enough detail to act on manually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No PATH hit and no candidate under the scan root.
    NotFound { name: String, root: PathBuf },
    /// Multiple candidates, none matching the preference substring.
    Ambiguous(Vec<PathBuf>),
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name, root } => write!(
                f,
                "no executable named '{}' on PATH or under {}",
                name,
                root.display()
            ),
            Self::Ambiguous(candidates) => {
                writeln!(f, "multiple candidates, no safe automatic choice:")?;
                for c in candidates {
                    writeln!(f, "  {}", c.display())?;
                }
                write!(f, "set the path manually in the pipeline config")
            }
        }
    }
}

/// Apply the selection policy. `candidates` is re-sorted here so the
/// tie-break does not depend on caller ordering.
pub fn select(
    name: &str,
    root: &Path,
    path_hit: Option<PathBuf>,
    mut candidates: Vec<PathBuf>,
    prefer: &str,
) -> Result<Selection, ResolutionError> {
    // PATH lookup always pre-empts the directory scan.
    if let Some(path) = path_hit {
        return Ok(Selection {
            path,
            source: SelectionSource::PathLookup,
        });
    }

    candidates.sort();
    candidates.dedup();

    match candidates.len() {
        0 => Err(ResolutionError::NotFound {
            name: name.to_string(),
            root: root.to_path_buf(),
        }),
        1 => Ok(Selection {
            path: candidates.remove(0),
            source: SelectionSource::SoleCandidate,
        }),
        _ => {
            let preferred = candidates
                .iter()
                .find(|c| c.to_string_lossy().contains(prefer))
                .cloned();
            match preferred {
                Some(path) => Ok(Selection {
                    path,
                    source: SelectionSource::PreferredCandidate,
                }),
                None => Err(ResolutionError::Ambiguous(candidates)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn root() -> PathBuf {
        PathBuf::from("/home/tito/EF5")
    }

    fn sel(path_hit: Option<&str>, candidates: &[&str]) -> Result<Selection, ResolutionError> {
        select(
            "ef5",
            &root(),
            path_hit.map(PathBuf::from),
            candidates.iter().map(PathBuf::from).collect(),
            "EF5LatestRelease",
        )
    }

    #[test]
    fn test_path_hit_preempts_scan() {
        let s = sel(Some("/usr/bin/ef5"), &["/root/b/EF5LatestRelease/ef5"]).unwrap();
        assert_eq!(s.path, PathBuf::from("/usr/bin/ef5"));
        assert_eq!(s.source, SelectionSource::PathLookup);
    }

    #[test]
    fn test_empty_is_not_found() {
        let e = sel(None, &[]).unwrap_err();
        match e {
            ResolutionError::NotFound { ref name, ref root } => {
                assert_eq!(name, "ef5");
                assert_eq!(root, &PathBuf::from("/home/tito/EF5"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_sole_candidate_selected() {
        let s = sel(None, &["/opt/ef5/bin/ef5"]).unwrap();
        assert_eq!(s.path, PathBuf::from("/opt/ef5/bin/ef5"));
        assert_eq!(s.source, SelectionSource::SoleCandidate);
    }

    #[test]
    fn test_preferred_among_many() {
        let s = sel(None, &["/root/a/ef5", "/root/b/EF5LatestRelease/ef5"]).unwrap();
        assert_eq!(s.path, PathBuf::from("/root/b/EF5LatestRelease/ef5"));
        assert_eq!(s.source, SelectionSource::PreferredCandidate);
    }

    #[test]
    fn test_ambiguous_lists_all_candidates() {
        let e = sel(None, &["/root/a/ef5", "/root/b/ef5", "/root/c/ef5"]).unwrap_err();
        match e {
            ResolutionError::Ambiguous(ref c) => assert_eq!(c.len(), 3),
            other => panic!("expected Ambiguous, got {:?}", other),
        }
        let msg = e.to_string();
        assert!(msg.contains("/root/a/ef5"));
        assert!(msg.contains("/root/c/ef5"));
    }

    #[test]
    fn test_first_sorted_preferred_wins() {
        // Two candidates carry the marker; the lexicographically first wins.
        let s = sel(
            None,
            &[
                "/z/EF5LatestRelease/ef5",
                "/a/EF5LatestRelease/ef5",
                "/m/ef5",
            ],
        )
        .unwrap();
        assert_eq!(s.path, PathBuf::from("/a/EF5LatestRelease/ef5"));
    }

    #[test]
    fn test_not_found_message_names_root() {
        let msg = sel(None, &[]).unwrap_err().to_string();
        assert!(msg.contains("ef5"));
        assert!(msg.contains("/home/tito/EF5"));
    }

    proptest! {
        // Selection must not depend on the order candidates arrive in.
        #[test]
        fn prop_selection_is_order_independent(perm in Just(vec![
            "/scan/one/ef5",
            "/scan/two/ef5",
            "/scan/EF5LatestRelease/ef5",
            "/scan/three/ef5",
            "/scan/four/ef5",
        ]).prop_shuffle()) {
            let got = sel(None, &perm).unwrap();
            prop_assert_eq!(got.path, PathBuf::from("/scan/EF5LatestRelease/ef5"));
            prop_assert_eq!(got.source, SelectionSource::PreferredCandidate);
        }

        // With no marker anywhere, every ordering must report the same
        // ambiguous set.
        #[test]
        fn prop_ambiguous_set_is_stable(perm in Just(vec![
            "/scan/one/ef5",
            "/scan/two/ef5",
            "/scan/three/ef5",
        ]).prop_shuffle()) {
            match sel(None, &perm) {
                Err(ResolutionError::Ambiguous(c)) => {
                    let expect: Vec<PathBuf> = ["/scan/one/ef5", "/scan/three/ef5", "/scan/two/ef5"]
                        .iter().map(PathBuf::from).collect();
                    prop_assert_eq!(c, expect);
                }
                other => prop_assert!(false, "expected Ambiguous, got {:?}", other),
            }
        }
    }
}
