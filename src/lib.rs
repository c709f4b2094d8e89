//! vibedir: Markdown prompt sessions plus the collaborators around them.
//!
//! The session file itself is owned by the [`session_store`] crate, re-exported
//! here. This crate adds the pieces a front end needs to drive it:
//!
//! - [`config`]: environment flags and layered TOML configuration that supply
//!   prompt icons, model label and status icons.
//! - [`logging`]: `tracing` subscriber setup.
//! - [`models`]: command status icons and prompt attachments.
//! - [`watcher`]: change notifications for the session file.
//! - [`min_context`]: unique-context sizing for line anchors.
//! - [`prompt`]: prompt templates for prepped directories and reply checks.

pub mod config;
pub mod logging;
pub mod min_context;
pub mod models;
pub mod prompt;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use session_store::{
    default_session_path, Message, PromptIcons, Role, SessionStore, SessionStoreError,
    Transcript, DEFAULT_MODEL_LABEL,
};

pub use crate::config::{
    load_config, ConfigError, EnvConfig, LoadOptions, LoadedConfig, Settings, DEFAULT_NAMESPACE,
};
pub use crate::min_context::{calculate_min_context, MinContextError};
pub use crate::models::{Attachment, AttachmentKind, CommandAttachment, CommandStatus, StatusIcons};
pub use crate::prompt::{build_prompt, validate_response, PromptError};
pub use crate::watcher::SessionWatcher;

/// Opens the store for `path` with the icons and default model from `settings`.
pub fn open_session(
    path: impl Into<std::path::PathBuf>,
    settings: &Settings,
) -> Result<SessionStore, SessionStoreError> {
    SessionStore::new(path, settings.prompt_icons())?.with_default_model(&settings.llm.model)
}
