//! Tracing configuration and log routing.
//!
//! Logs always go to stdout through a compact formatter. A second, non‑blocking file layer is
//! selected by `PAPERCHAT_LOG_FILE`:
//!
//! - unset: daily-rotated files under `logs/` named `paperchat.log.<date>`;
//! - `off` / `none`: no file layer;
//! - any other value: append to that path.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_VAR: &str = "PAPERCHAT_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_PREFIX: &str = "paperchat.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where file logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Stdout only.
    Disabled,
    /// Append to a single file.
    File(PathBuf),
    /// Daily rotation inside a directory.
    Daily {
        /// Directory holding the rotated files.
        directory: PathBuf,
        /// File name prefix.
        prefix: String,
    },
}

impl LogTarget {
    /// Interpret the value of `PAPERCHAT_LOG_FILE`.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Daily {
                directory: PathBuf::from(DEFAULT_LOG_DIR),
                prefix: DEFAULT_LOG_PREFIX.to_string(),
            },
            Some(value)
                if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("none") =>
            {
                Self::Disabled
            }
            Some(path) => Self::File(PathBuf::from(path)),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` controls filtering and defaults to `info`.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let target = LogTarget::from_setting(std::env::var(LOG_FILE_VAR).ok().as_deref());
    if let Some(writer) = file_writer(&target) {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
    } else {
        registry.init();
    }
}

fn file_writer(target: &LogTarget) -> Option<NonBlocking> {
    let (non_blocking, guard) = match target {
        LogTarget::Disabled => return None,
        LogTarget::File(path) => {
            let file = open_append(path)?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::Daily { directory, prefix } => {
            if let Err(err) = std::fs::create_dir_all(directory) {
                eprintln!("Failed to create log directory {}: {err}", directory.display());
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}

fn open_append(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty())
        && let Err(err) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create log directory {}: {err}", parent.display());
        return None;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
        .ok()
}
