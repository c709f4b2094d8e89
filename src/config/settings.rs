use std::collections::BTreeMap;

use serde::Deserialize;
use session_store::PromptIcons;

use crate::models::StatusIcons;
use crate::prompt::DEFAULT_PROMPT_TEMPLATE;

/// Typed view of the merged configuration.
///
/// Every field has a default so partial files deserialize; keys this struct
/// does not know stay reachable through [`super::LoadedConfig::get`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: String,
    pub clipboard_max_chars_per_file: u64,
    pub ask_llm_for_commit_message: bool,
    pub auto_commit: String,
    pub prompt_template: String,
    pub show_command_legend_in_header: bool,
    pub llm: LlmSettings,
    pub prompt_icons: PromptIconSettings,
    pub status_icons: BTreeMap<String, String>,
    pub logging: LoggingSettings,
    #[serde(rename = "command")]
    pub commands: Vec<CommandSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: "clipboard".to_string(),
            clipboard_max_chars_per_file: 40_000,
            ask_llm_for_commit_message: true,
            auto_commit: "ask".to_string(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            show_command_legend_in_header: true,
            llm: LlmSettings::default(),
            prompt_icons: PromptIconSettings::default(),
            status_icons: BTreeMap::new(),
            logging: LoggingSettings::default(),
            commands: Vec::new(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn prompt_icons(&self) -> PromptIcons {
        PromptIcons::new(&self.prompt_icons.user, &self.prompt_icons.assistant)
    }

    #[must_use]
    pub fn status_icons(&self) -> StatusIcons {
        StatusIcons::from_overrides(&self.status_icons)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: session_store::DEFAULT_MODEL_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromptIconSettings {
    pub user: String,
    pub assistant: String,
}

impl Default for PromptIconSettings {
    fn default() -> Self {
        let icons = PromptIcons::default();
        Self {
            user: icons.user,
            assistant: icons.assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
        }
    }
}

/// A `[[command]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub name: String,
    pub command: String,
    pub run_on: Vec<String>,
    pub show_in_header: bool,
    pub include_results: bool,
    pub success: String,
    pub hotkey: Option<String>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            command: String::new(),
            run_on: Vec::new(),
            show_in_header: false,
            include_results: false,
            success: "exit_code".to_string(),
            hotkey: None,
        }
    }
}

impl CommandSettings {
    /// A command without a shell line cannot run.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }
}
