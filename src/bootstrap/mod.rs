//! Python environment bootstrap for the orchestrator.
//!
//! Creates the virtual environment the nowcasting orchestrator runs in and
//! installs its requirements. A marker file records what was installed so a
//! repeat run with the same requirements is a no-op.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(windows)]
const VENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const VENV_BIN_DIR: &str = "bin";

#[cfg(windows)]
const PYTHON_CANDIDATES: &[&str] = &["python"];
#[cfg(not(windows))]
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

const MARKER_NAME: &str = ".titoctl-env.json";

/// What the bootstrap step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Environment exists and its marker matches the requested requirements.
    UpToDate,
    Installed,
}

/// Marker recording which titoctl version installed which requirements.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct EnvMarker {
    version: String,
    requirements: Vec<String>,
}

impl EnvMarker {
    fn current(requirements: &[String]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            requirements: requirements.to_vec(),
        }
    }
}

/// Ensure `env_dir` holds a virtualenv with `requirements` installed.
pub fn bootstrap_env(env_dir: &Path, requirements: &[String]) -> Result<BootstrapOutcome, String> {
    let env_python = venv_python(env_dir);

    if env_python.exists() && load_marker(env_dir).as_ref() == Some(&EnvMarker::current(requirements)) {
        return Ok(BootstrapOutcome::UpToDate);
    }

    if !env_python.exists() {
        let python = find_python().ok_or_else(|| {
            format!(
                "no Python interpreter on PATH (tried: {})",
                PYTHON_CANDIDATES.join(", ")
            )
        })?;
        run_checked(
            Command::new(&python).args(["-m", "venv"]).arg(env_dir),
            "venv creation",
        )?;
    }

    if !requirements.is_empty() {
        run_checked(
            Command::new(&env_python)
                .args(["-m", "pip", "install"])
                .args(requirements),
            "pip install",
        )?;
    }

    // Marker lands only after a successful install
    let marker = serde_json::to_string_pretty(&EnvMarker::current(requirements))
        .map_err(|e| format!("marker serialize error: {}", e))?;
    std::fs::write(marker_path(env_dir), marker)
        .map_err(|e| format!("cannot write env marker: {}", e))?;

    Ok(BootstrapOutcome::Installed)
}

/// The interpreter inside the virtualenv.
pub fn venv_python(env_dir: &Path) -> PathBuf {
    env_dir.join(VENV_BIN_DIR).join("python")
}

fn marker_path(env_dir: &Path) -> PathBuf {
    env_dir.join(MARKER_NAME)
}

fn load_marker(env_dir: &Path) -> Option<EnvMarker> {
    let content = std::fs::read_to_string(marker_path(env_dir)).ok()?;
    serde_json::from_str(&content).ok()
}

fn find_python() -> Option<PathBuf> {
    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn run_checked(cmd: &mut Command, what: &str) -> Result<(), String> {
    let output = cmd
        .output()
        .map_err(|e| format!("failed to spawn {}: {}", what, e))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{} failed (exit {}): {}",
            what,
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
    }
}
