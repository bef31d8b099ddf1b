//! CLI subcommands — resolve, fetch, bootstrap, run.

use crate::resolver::SelectionSource;
use crate::{bootstrap, config, fetch, resolver, runner};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Locate the EF5 binary and record its path in the pipeline config
    Resolve {
        /// Executable name to look for
        #[arg(long, default_value = resolver::DEFAULT_NAME)]
        name: String,

        /// Fallback scan root (default: $HOME/EF5)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Substring marking the preferred release directory
        #[arg(long, default_value = resolver::DEFAULT_PREFER)]
        prefer: String,

        /// Pipeline config file to patch; without it the resolution is only printed
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Config key holding the executable path
        #[arg(long, default_value = config::DEFAULT_KEY)]
        key: String,
    },

    /// Download a data archive and extract it in place
    Fetch {
        /// Archive URL (.zip, .tar.gz, .tgz)
        url: String,

        /// Destination directory; skipped when already populated
        #[arg(short, long, default_value = "basic")]
        dest: PathBuf,

        /// Hex SHA-256 of the archive, verified before extraction
        #[arg(long)]
        sha256: Option<String>,
    },

    /// Create the orchestrator's Python environment
    Bootstrap {
        /// Virtualenv directory
        #[arg(long, default_value = ".venv")]
        env_dir: PathBuf,

        /// Package to install (pip requirement specifier, repeatable)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,
    },

    /// Run the orchestrator once, logging its output
    Run {
        /// Minute of the hour to wait for before starting
        #[arg(long)]
        at_minute: Option<u32>,

        /// Directory for run logs
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Orchestrator command and its arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Resolve {
            name,
            root,
            prefer,
            config,
            key,
        } => cmd_resolve(name, root, prefer, config, &key),
        Commands::Fetch { url, dest, sha256 } => cmd_fetch(&url, &dest, sha256.as_deref()),
        Commands::Bootstrap {
            env_dir,
            requirements,
        } => cmd_bootstrap(&env_dir, &requirements),
        Commands::Run {
            at_minute,
            log_dir,
            command,
        } => cmd_run(&command, &log_dir, at_minute),
    }
}

fn cmd_resolve(
    name: String,
    root: Option<PathBuf>,
    prefer: String,
    config_path: Option<PathBuf>,
    key: &str,
) -> Result<(), String> {
    let root = match root {
        Some(r) => r,
        None => resolver::default_search_root()
            .ok_or_else(|| "cannot determine home directory for the default scan root".to_string())?,
    };

    let r = resolver::Resolver::new(name, root, prefer);
    let selection = r.resolve().map_err(|e| e.to_string())?;

    match selection.source {
        SelectionSource::PathLookup => {
            println!("found '{}' on PATH: {}", r.name, selection.path.display());
        }
        SelectionSource::SoleCandidate => {
            println!(
                "found one candidate under {}: {}",
                r.root.display(),
                selection.path.display()
            );
        }
        SelectionSource::PreferredCandidate => {
            println!(
                "note: several candidates under {}; picked the one matching '{}': {}",
                r.root.display(),
                r.prefer,
                selection.path.display()
            );
        }
    }

    if let Some(cfg) = config_path {
        let value = selection.path.display().to_string();
        config::patch_key(&cfg, key, &value).map_err(|e| e.to_string())?;
        println!("updated {} in {}", key, cfg.display());
    }

    Ok(())
}

fn cmd_fetch(url: &str, dest: &std::path::Path, sha256: Option<&str>) -> Result<(), String> {
    match fetch::fetch_archive(url, dest, sha256)? {
        fetch::FetchOutcome::AlreadyPresent => {
            println!("{} already populated, skipping download", dest.display());
        }
        fetch::FetchOutcome::Extracted => {
            println!("extracted {} into {}", url, dest.display());
        }
    }
    Ok(())
}

fn cmd_bootstrap(env_dir: &std::path::Path, requirements: &[String]) -> Result<(), String> {
    match bootstrap::bootstrap_env(env_dir, requirements)? {
        bootstrap::BootstrapOutcome::UpToDate => {
            println!("environment at {} is up to date", env_dir.display());
        }
        bootstrap::BootstrapOutcome::Installed => {
            println!(
                "environment ready: {}",
                bootstrap::venv_python(env_dir).display()
            );
        }
    }
    Ok(())
}

fn cmd_run(
    command: &[String],
    log_dir: &std::path::Path,
    at_minute: Option<u32>,
) -> Result<(), String> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| "no orchestrator command given".to_string())?;

    println!("starting {} at {}", program, runner::now_iso8601());
    let (code, log_path) = runner::run_once(program, args, log_dir, at_minute)?;
    println!("finished with exit {} (log: {})", code, log_path.display());

    if code == 0 {
        Ok(())
    } else {
        Err(format!("{} exited with {}", program, code))
    }
}
