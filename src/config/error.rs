use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid namespace '{namespace}': {reason}")]
    InvalidNamespace {
        namespace: String,
        reason: &'static str,
    },

    #[error("no bundled config.toml for namespace '{namespace}'")]
    NoBundledConfig { namespace: String },

    #[error("custom config path does not exist: {path}")]
    MissingCustomPath { path: PathBuf },

    #[error("config file already exists: {path}; use --force to overwrite")]
    AlreadyExists { path: PathBuf },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse editable TOML in {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("merged configuration does not match the settings schema: {0}")]
    Invalid(#[source] toml::de::Error),

    #[error("invalid config key '{key}'")]
    InvalidKey { key: String },
}

impl ConfigError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
