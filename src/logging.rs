//! Tracing setup: compact stdout output plus a non-blocking log file.
//!
//! The file defaults to `logs/docpipe.log`. `DOCPIPE_LOG_FILE` picks another path, or disables
//! file output entirely when set to `off`. `DOCPIPE_LOG_ROTATION` selects `never` (default),
//! `hourly`, or `daily` rotation; rotated files get a date suffix.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_FILTER: &str = "info,tower_http=info";
const DEFAULT_LOG_FILE: &str = "logs/docpipe.log";

/// Where file logs go and how often the file rolls over.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogFile {
    directory: PathBuf,
    file_name: String,
    rotation: Rotation,
}

impl LogFile {
    /// Resolve the log file from the raw `DOCPIPE_LOG_FILE` and `DOCPIPE_LOG_ROTATION` values.
    fn resolve(path: Option<&str>, rotation: Option<&str>) -> Option<Self> {
        let path = match path.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("off") => return None,
            Some(value) if !value.is_empty() => Path::new(value),
            _ => Path::new(DEFAULT_LOG_FILE),
        };
        let file_name = path.file_name()?.to_str()?.to_string();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let rotation = match rotation.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("hourly") => Rotation::HOURLY,
            Some("daily") => Rotation::DAILY,
            _ => Rotation::NEVER,
        };
        Some(Self {
            directory,
            file_name,
            rotation,
        })
    }

    fn from_env() -> Option<Self> {
        Self::resolve(
            std::env::var("DOCPIPE_LOG_FILE").ok().as_deref(),
            std::env::var("DOCPIPE_LOG_ROTATION").ok().as_deref(),
        )
    }

    fn writer(&self) -> Option<NonBlocking> {
        if let Err(err) = std::fs::create_dir_all(&self.directory) {
            eprintln!(
                "Failed to create log directory {}: {err}",
                self.directory.display()
            );
            return None;
        }
        let appender =
            RollingFileAppender::new(self.rotation.clone(), &self.directory, &self.file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        Some(non_blocking)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering and falls back to `info`. The file layer is skipped when its
/// directory cannot be created.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let file_layer = LogFile::from_env()
        .and_then(|log_file| log_file.writer())
        .map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .compact()
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}
