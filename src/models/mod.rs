//! Attachment and command status models shown alongside a prompt.

mod attachment;
mod command_status;

use std::path::PathBuf;

use thiserror::Error;

pub use attachment::{Attachment, AttachmentKind, CommandAttachment};
pub use command_status::{CommandStatus, StatusIcons};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid status '{0}'; expected one of not_configured, not_run, waiting, running, success, failed")]
    InvalidStatus(String),

    #[error("invalid output_format '{0}'; use letters, digits, '.' or '-' only")]
    InvalidOutputFormat(String),

    #[error("invalid output_format length {0}; expected 1 to 40 characters")]
    OutputFormatLength(usize),

    #[error("invalid base path for command output: {path} (expected a .json file)")]
    InvalidOutputBase { path: PathBuf },

    #[error("attachment at {path} is not a command attachment")]
    NotACommand { path: PathBuf },

    #[error("failed to format attachment timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}
