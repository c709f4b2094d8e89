use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use super::{CommandStatus, ModelError, StatusIcons};

const MAX_OUTPUT_FORMAT_LEN: usize = 40;

/// A file or command result attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub timestamp: String,
    pub kind: AttachmentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    File {
        original_path: Option<PathBuf>,
        /// SHA-256 hex digest used for deduplication.
        hash: Option<String>,
    },
    Command(CommandAttachment),
}

impl Attachment {
    /// Builds an attachment stamped now. Relative paths are made absolute
    /// against `cwd`; a path that does not exist is accepted with a warning.
    pub fn new(path: &Path, cwd: &Path, kind: AttachmentKind) -> Result<Self, ModelError> {
        let path = normalize_path(path, cwd);
        if !path.exists() {
            warn!(path = %path.display(), "attachment path does not exist; proceeding without validation");
        }
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(ModelError::ClockFormat)?;

        Ok(Self {
            path,
            timestamp,
            kind,
        })
    }

    pub fn file(
        path: &Path,
        cwd: &Path,
        original_path: Option<PathBuf>,
        hash: Option<String>,
    ) -> Result<Self, ModelError> {
        Self::new(
            path,
            cwd,
            AttachmentKind::File {
                original_path,
                hash,
            },
        )
    }

    pub fn command(path: &Path, cwd: &Path, command: CommandAttachment) -> Result<Self, ModelError> {
        Self::new(path, cwd, AttachmentKind::Command(command))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            AttachmentKind::File { .. } => "file",
            AttachmentKind::Command(_) => "command",
        }
    }

    /// For command attachments, the sibling file that holds captured output.
    pub fn command_output_path(&self) -> Result<PathBuf, ModelError> {
        match &self.kind {
            AttachmentKind::Command(command) => command.compute_output_path(&self.path),
            AttachmentKind::File { .. } => Err(ModelError::NotACommand {
                path: self.path.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAttachment {
    pub name: String,
    pub status: CommandStatus,
    pub output: Option<String>,
    pub success_value: Option<bool>,
    pub output_path: Option<PathBuf>,
    output_format: String,
}

impl CommandAttachment {
    pub fn new(name: impl Into<String>, status: &str) -> Result<Self, ModelError> {
        Ok(Self {
            name: name.into(),
            status: status.parse()?,
            output: None,
            success_value: None,
            output_path: None,
            output_format: "txt".to_string(),
        })
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    #[must_use]
    pub fn with_success_value(mut self, success: bool) -> Self {
        self.success_value = Some(success);
        self
    }

    /// Accepts letters, digits, `.` and `-`, at most 40 characters; stored
    /// lowercased.
    pub fn with_output_format(mut self, format: &str) -> Result<Self, ModelError> {
        self.output_format = validate_output_format(format)?;
        Ok(self)
    }

    #[must_use]
    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    /// `dir/name.json` maps to `dir/name_output.<format>`.
    pub fn compute_output_path(&self, base: &Path) -> Result<PathBuf, ModelError> {
        let is_json = base.extension().is_some_and(|extension| extension == "json");
        let stem = base.file_stem().and_then(|stem| stem.to_str());
        match stem {
            Some(stem) if is_json => {
                Ok(base.with_file_name(format!("{stem}_output.{}", self.output_format)))
            }
            _ => Err(ModelError::InvalidOutputBase {
                path: base.to_path_buf(),
            }),
        }
    }

    #[must_use]
    pub fn status_icon<'a>(&self, icons: &'a StatusIcons) -> &'a str {
        icons.icon(self.status)
    }
}

fn validate_output_format(format: &str) -> Result<String, ModelError> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    if format.is_empty() || format.len() > MAX_OUTPUT_FORMAT_LEN {
        return Err(ModelError::OutputFormatLength(format.len()));
    }

    let valid = PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9.-]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(format));
    if !valid {
        return Err(ModelError::InvalidOutputFormat(format.to_string()));
    }

    Ok(format.to_ascii_lowercase())
}

fn normalize_path(path: &Path, cwd: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| cwd.join(path))
}
