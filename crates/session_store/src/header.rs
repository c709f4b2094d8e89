//! Header line grammar for session files.
//!
//! The grammar embeds the configured prompt icons, so one [`HeaderGrammar`] is
//! compiled per store and is fixed for that store's lifetime.

use regex::Regex;

use crate::error::SessionStoreError;
use crate::message::{PromptIcons, Role};

const TIMESTAMP: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{1,3}";

/// Prefix of the first line of every file written by the store.
pub const SESSION_HEADER_PREFIX: &str = "# vibedir session - ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub role: Role,
    pub timestamp: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HeaderGrammar {
    pattern: Regex,
}

impl HeaderGrammar {
    pub fn new(icons: &PromptIcons) -> Result<Self, SessionStoreError> {
        let user = regex::escape(&icons.user);
        let assistant = regex::escape(&icons.assistant);
        let source = format!(
            "^## (?:{user}User - (?P<user_ts>{TIMESTAMP})\
             |{assistant}Assistant \\((?P<model>.+?)\\) - (?P<assistant_ts>{TIMESTAMP})\
             |{user}Pending → .+?(?: - (?P<pending_ts>{TIMESTAMP}))?)$"
        );
        let pattern = Regex::new(&source).map_err(SessionStoreError::Grammar)?;
        Ok(Self { pattern })
    }

    /// Recognizes a message boundary. Lines that merely resemble a header
    /// return `None` and are treated as content by the caller.
    #[must_use]
    pub fn match_line(&self, line: &str) -> Option<HeaderMatch> {
        let captures = self.pattern.captures(line)?;
        let owned = |name: &str| captures.name(name).map(|value| value.as_str().to_string());

        if let Some(timestamp) = owned("user_ts") {
            return Some(HeaderMatch {
                role: Role::User,
                timestamp: Some(timestamp),
                model: None,
            });
        }

        if let Some(timestamp) = owned("assistant_ts") {
            return Some(HeaderMatch {
                role: Role::Assistant,
                timestamp: Some(timestamp),
                model: owned("model"),
            });
        }

        Some(HeaderMatch {
            role: Role::Pending,
            timestamp: owned("pending_ts"),
            model: None,
        })
    }
}

#[must_use]
pub fn session_header(timestamp: &str) -> String {
    format!("{SESSION_HEADER_PREFIX}{timestamp}\n\n")
}

#[cfg(test)]
mod tests {
    use super::{session_header, HeaderGrammar, HeaderMatch};
    use crate::message::{PromptIcons, Role};

    fn grammar() -> HeaderGrammar {
        HeaderGrammar::new(&PromptIcons::default()).expect("default icons compile")
    }

    #[test]
    fn matches_user_header() {
        assert_eq!(
            grammar().match_line("## 👤User - 2025-11-17 14:22:31.222"),
            Some(HeaderMatch {
                role: Role::User,
                timestamp: Some("2025-11-17 14:22:31.222".to_string()),
                model: None,
            })
        );
    }

    #[test]
    fn matches_assistant_header_and_captures_model() {
        assert_eq!(
            grammar().match_line("## 🤖Assistant (grok-4 (beta)) - 2025-11-17 14:23:15.31"),
            Some(HeaderMatch {
                role: Role::Assistant,
                timestamp: Some("2025-11-17 14:23:15.31".to_string()),
                model: Some("grok-4 (beta)".to_string()),
            })
        );
    }

    #[test]
    fn matches_pending_header_with_and_without_timestamp() {
        let grammar = grammar();
        assert_eq!(
            grammar.match_line("## 👤Pending → (edit below)"),
            Some(HeaderMatch {
                role: Role::Pending,
                timestamp: None,
                model: None,
            })
        );
        assert_eq!(
            grammar.match_line("## 👤Pending → (edit below) - 2025-11-17 14:26:00.000"),
            Some(HeaderMatch {
                role: Role::Pending,
                timestamp: Some("2025-11-17 14:26:00.000".to_string()),
                model: None,
            })
        );
    }

    #[test]
    fn near_misses_are_not_headers() {
        let grammar = grammar();
        for line in [
            "## 👤User",
            "## User - 2025-11-17 14:22:31.222",
            "## 🤖User - 2025-11-17 14:22:31.222",
            "## 👤User - 2025-11-17 14:22:31",
            "## 👤User - 2025-11-17 14:22:31.2222",
            "### 👤User - 2025-11-17 14:22:31.222",
            " ## 👤User - 2025-11-17 14:22:31.222",
            "## 🤖Assistant - 2025-11-17 14:22:31.222",
            "## 👤Pending →",
            "# vibedir session - 2025-11-17T14:22:31.222",
        ] {
            assert_eq!(grammar.match_line(line), None, "{line}");
        }
    }

    #[test]
    fn icons_are_matched_literally() {
        let grammar = HeaderGrammar::new(&PromptIcons::new("[*]", "(.)")).expect("compile");
        assert!(grammar
            .match_line("## [*]User - 2025-11-17 14:22:31.222")
            .is_some());
        assert!(grammar
            .match_line("## xUser - 2025-11-17 14:22:31.222")
            .is_none());
        assert!(grammar
            .match_line("## (.)Assistant (m) - 2025-11-17 14:22:31.222")
            .is_some());
        assert!(grammar
            .match_line("## (x)Assistant (m) - 2025-11-17 14:22:31.222")
            .is_none());
    }

    #[test]
    fn session_header_is_followed_by_blank_line() {
        assert_eq!(
            session_header("2025-11-17T14:22:31.222"),
            "# vibedir session - 2025-11-17T14:22:31.222\n\n"
        );
    }
}
