//! Pipeline config patching — rewrite one `key = "value"` line in place.
//!
//! The pipeline config is a plain-text file of assignment lines among
//! arbitrary comments and blank lines. Exactly one line is ever touched;
//! every other byte survives verbatim. The rewrite is atomic (temp file in
//! the same directory, then rename), so a crash mid-write leaves the
//! original untouched.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Key the pipeline config stores the EF5 binary path under.
pub const DEFAULT_KEY: &str = "ef5Path";

/// Why the config patch failed.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file does not exist at the attempted path.
    FileMissing(PathBuf),
    /// No line assigns the key. Absence is reported, never silently fixed
    /// by appending.
    KeyNotFound { key: String, path: PathBuf },
    /// Read, write, or rename failure.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileMissing(path) => write!(f, "config file missing: {}", path.display()),
            Self::KeyNotFound { key, path } => write!(
                f,
                "no '{}' assignment in {}; add the line manually",
                key,
                path.display()
            ),
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

/// Rewrite the first line assigning `key` to `key = "value"`. Idempotent:
/// re-applying the same value leaves the file byte-identical.
pub fn patch_key(path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileMissing(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let rewritten = rewrite(&content, key, value).ok_or_else(|| ConfigError::KeyNotFound {
        key: key.to_string(),
        path: path.to_path_buf(),
    })?;

    // Atomic replace: temp file in the same directory + rename
    let tmp = path.with_extension("titoctl.tmp");
    std::fs::write(&tmp, &rewritten).map_err(|e| ConfigError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Pure rewrite of the file content. Returns None when no line assigns the
/// key. Only the first matching line is replaced; its line terminator and
/// every other line are preserved byte-for-byte.
fn rewrite(content: &str, key: &str, value: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len() + value.len());
    let mut replaced = false;

    for piece in content.split_inclusive('\n') {
        let (body, terminator) = split_terminator(piece);
        if !replaced && line_assigns_key(body, key) {
            out.push_str(key);
            out.push_str(" = \"");
            out.push_str(value);
            out.push('"');
            out.push_str(terminator);
            replaced = true;
        } else {
            out.push_str(piece);
        }
    }

    replaced.then_some(out)
}

/// Split a line piece into its body and its `\n`/`\r\n` terminator.
fn split_terminator(piece: &str) -> (&str, &str) {
    if let Some(body) = piece.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = piece.strip_suffix('\n') {
        (body, "\n")
    } else {
        (piece, "")
    }
}

/// True when the line is `key = ...` — optional leading whitespace, the key
/// itself, then optional whitespace and `=`. A longer key sharing the
/// prefix (`ef5Path2`) must not match.
fn line_assigns_key(line: &str, key: &str) -> bool {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(key) {
        Some(rest) => rest.trim_start().starts_with('='),
        None => false,
    }
}
