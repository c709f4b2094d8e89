use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandStatus {
    NotConfigured,
    NotRun,
    Waiting,
    Running,
    Success,
    Failed,
}

impl CommandStatus {
    pub const ALL: [CommandStatus; 6] = [
        Self::NotConfigured,
        Self::NotRun,
        Self::Waiting,
        Self::Running,
        Self::Success,
        Self::Failed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::NotRun => "not_run",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// `running` renders as an animated spinner rather than a glyph.
    #[must_use]
    pub fn default_icon(self) -> &'static str {
        match self {
            Self::NotConfigured => "⚠️",
            Self::NotRun => "❓",
            Self::Waiting => "⏳",
            Self::Running => "spinner",
            Self::Success => "✅",
            Self::Failed => "❌",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandStatus {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ModelError::InvalidStatus(value.to_string()))
    }
}

/// Icon table for command statuses, defaults overridden by `[status_icons]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIcons {
    icons: BTreeMap<CommandStatus, String>,
}

impl Default for StatusIcons {
    fn default() -> Self {
        Self {
            icons: CommandStatus::ALL
                .into_iter()
                .map(|status| (status, status.default_icon().to_string()))
                .collect(),
        }
    }
}

impl StatusIcons {
    /// Unknown status names are logged and ignored.
    #[must_use]
    pub fn from_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut icons = Self::default();
        for (name, icon) in overrides {
            match name.parse::<CommandStatus>() {
                Ok(status) => {
                    debug!(status = %status, icon = %icon, "overriding command status icon");
                    icons.icons.insert(status, icon.clone());
                }
                Err(_) => warn!(status = %name, "unknown status in [status_icons]; ignoring icon override"),
            }
        }
        icons
    }

    #[must_use]
    pub fn icon(&self, status: CommandStatus) -> &str {
        self.icons
            .get(&status)
            .map_or_else(|| status.default_icon(), String::as_str)
    }

    pub fn icon_for(&self, status: &str) -> Result<&str, ModelError> {
        Ok(self.icon(status.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandStatus, StatusIcons};
    use crate::models::ModelError;
    use std::collections::BTreeMap;

    #[test]
    fn six_statuses_round_trip_through_names() {
        assert_eq!(CommandStatus::ALL.len(), 6);
        for status in CommandStatus::ALL {
            assert_eq!(status.as_str().parse::<CommandStatus>().ok(), Some(status));
        }
        assert!(matches!(
            "bogus".parse::<CommandStatus>(),
            Err(ModelError::InvalidStatus(_))
        ));
    }

    #[test]
    fn overrides_replace_known_icons_and_skip_unknown() {
        let overrides = BTreeMap::from([
            ("success".to_string(), "👍".to_string()),
            ("unknown".to_string(), "ignored".to_string()),
        ]);

        let icons = StatusIcons::from_overrides(&overrides);
        assert_eq!(icons.icon(CommandStatus::Success), "👍");
        assert_eq!(icons.icon(CommandStatus::Failed), "❌");
        assert_eq!(icons.icon_for("success").ok(), Some("👍"));
        assert!(icons.icon_for("invalid").is_err());
    }
}
