//! Environment configuration.

use std::env;
use std::path::PathBuf;

pub const SKIP_CONFIG_FILE_LOAD: &str = "VIBEDIR_SKIP_CONFIG_FILE_LOAD";
pub const SKIP_BUNDLED_CONFIG_LOAD: &str = "VIBEDIR_SKIP_BUNDLED_CONFIG_LOAD";
pub const LOG_FILTER: &str = "VIBEDIR_LOG";
pub const LOG_FILE: &str = "VIBEDIR_LOG_FILE";
pub const SESSION_FILE: &str = "VIBEDIR_SESSION_FILE";

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub skip_config_file_load: bool,
    pub skip_bundled_config_load: bool,
    pub log_filter: Option<String>,
    pub log_file: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            skip_config_file_load: env_flag(SKIP_CONFIG_FILE_LOAD),
            skip_bundled_config_load: env_flag(SKIP_BUNDLED_CONFIG_LOAD),
            log_filter: env_string_opt(LOG_FILTER),
            log_file: env_string_opt(LOG_FILE).map(PathBuf::from),
            session_file: env_string_opt(SESSION_FILE).map(PathBuf::from),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|value| {
            let value = value.trim();
            value == "1" || value.eq_ignore_ascii_case("true")
        })
        .unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
