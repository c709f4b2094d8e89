use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown role '{0}'; expected one of user, assistant, pending")]
    UnknownRole(String),

    #[error("pending messages cannot be appended to {path}; use write_pending instead")]
    PendingAppend { path: PathBuf },

    #[error("invalid assistant model label {label:?}: must be non-blank and on one line")]
    InvalidModelLabel { label: String },

    #[error("failed to build header grammar from prompt icons: {0}")]
    Grammar(#[source] regex::Error),

    #[error("no pending block found in {path} after appending one")]
    PendingRepairFailed { path: PathBuf },

    #[error("failed to format current local timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl SessionStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
