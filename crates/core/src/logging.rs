//! Logging setup
//!
//! Installs a `tracing` subscriber once per process. `RUST_LOG` wins when
//! set; otherwise the level is `info`, or `debug` with the debug flag.
//! Library code never reaches for a global logger: repositories get a
//! [`tracing::Span`] at construction (see [`repository_span`]).

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::errors::{Result, VaultError};

fn filter(debug: bool) -> EnvFilter {
    let default_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, writing to `log_file` or stderr
///
/// A TUI owns the terminal, so front-ends that draw should pass a file.
pub fn init(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        },
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| VaultError::Other(format!("Failed to install logger: {}", e)))
}

/// Span handed to a repository so its events carry the store path
pub fn repository_span(db_path: &Path) -> Span {
    tracing::info_span!("prompt_repository", db = %db_path.display())
}
