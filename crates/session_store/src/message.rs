use std::fmt;
use std::str::FromStr;

use crate::clock;
use crate::error::SessionStoreError;

pub const DEFAULT_USER_ICON: &str = "👤";
pub const DEFAULT_ASSISTANT_ICON: &str = "🤖";

/// Label written into pending headers.
pub const PENDING_LABEL: &str = "(edit below)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    Pending,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionStoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "pending" => Ok(Self::Pending),
            other => Err(SessionStoreError::UnknownRole(other.to_string())),
        }
    }
}

/// Glyphs prefixed to the role name in every header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptIcons {
    pub user: String,
    pub assistant: String,
}

impl PromptIcons {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

impl Default for PromptIcons {
    fn default() -> Self {
        Self::new(DEFAULT_USER_ICON, DEFAULT_ASSISTANT_ICON)
    }
}

/// Checks that `label` can sit between the parentheses of an assistant
/// header and be read back.
pub fn validate_model_label(label: &str) -> Result<&str, SessionStoreError> {
    if label.trim().is_empty() || label.contains(['\n', '\r']) {
        return Err(SessionStoreError::InvalidModelLabel {
            label: label.to_string(),
        });
    }
    Ok(label)
}

/// One transcript turn. Built once by the parser or by a store mutation and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    timestamp: Option<String>,
    content: String,
    model: Option<String>,
}

impl Message {
    pub fn new(role: Role, timestamp: Option<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            timestamp,
            content: content.into(),
            model: None,
        }
    }

    pub fn pending(content: impl Into<String>) -> Self {
        Self::new(Role::Pending, None, content)
    }

    /// Attaches the assistant model label recovered from a header line.
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.role == Role::Pending
    }

    /// Renders the header line and body as written to the session file.
    ///
    /// User and assistant blocks end with a blank line; the pending block ends
    /// with a single newline. A missing timestamp is stamped with the current
    /// local time.
    pub fn render(
        &self,
        icons: &PromptIcons,
        model_label: &str,
    ) -> Result<String, SessionStoreError> {
        let block = match self.role {
            Role::User => format!(
                "## {}User - {}\n\n{}\n\n",
                icons.user,
                self.timestamp_or_now()?,
                self.content
            ),
            Role::Assistant => format!(
                "## {}Assistant ({}) - {}\n\n{}\n\n",
                icons.assistant,
                validate_model_label(model_label)?,
                self.timestamp_or_now()?,
                self.content
            ),
            Role::Pending => format!(
                "## {}Pending → {PENDING_LABEL}\n\n{}\n",
                icons.user, self.content
            ),
        };

        Ok(block)
    }

    fn timestamp_or_now(&self) -> Result<String, SessionStoreError> {
        match &self.timestamp {
            Some(timestamp) => Ok(timestamp.clone()),
            None => clock::message_timestamp_now(),
        }
    }
}
