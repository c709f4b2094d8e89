//! Tracing subscriber setup.
//!
//! Filter precedence: `VIBEDIR_LOG`, then the configured `[logging] level`,
//! then `info`. Output goes to stderr unless `VIBEDIR_LOG_FILE` names a file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

pub const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Builds the filter from the environment directive or `configured_level`.
#[must_use]
pub fn env_filter(env: &EnvConfig, configured_level: Option<&str>) -> EnvFilter {
    env.log_filter
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| {
            configured_level
                .map(str::to_ascii_lowercase)
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the global subscriber. A subscriber that is already installed is
/// left in place.
pub fn init_logging(env: &EnvConfig, configured_level: Option<&str>) -> Result<(), LoggingError> {
    let filter = env_filter(env, configured_level);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &env.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    Ok(())
}
