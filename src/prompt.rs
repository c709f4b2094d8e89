//! Prompt assembly for a prepped directory dump and checks on the reply.
//!
//! Templates use `{user_request}` and `{prepped_dir_content}` placeholders;
//! `{{` and `}}` produce literal braces.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are a code modification assistant.

Change request: {user_request}

The project files follow, each wrapped in \"Begin File\" and \"End File\" markers.
Reply with the complete modified content in the same format, keeping every marker.

{prepped_dir_content}
";

pub const DEFAULT_OUTPUT_FILE: &str = "modified_prepped_dir.txt";

/// Markers every usable reply must contain.
pub const FILE_MARKERS: [&str; 2] = ["Begin File", "End File"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown placeholder '{{{name}}}' in prompt template")]
    UnknownPlaceholder { name: String },

    #[error("unmatched '{brace}' at byte {offset} in prompt template")]
    UnmatchedBrace { brace: char, offset: usize },

    #[error("failed to compile placeholder pattern: {0}")]
    Pattern(#[source] regex::Error),

    #[error("invalid LLM response: missing required file markers")]
    MissingMarkers,

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PromptError {
    fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

fn token_pattern() -> Result<&'static Regex, PromptError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]"))
        .as_ref()
        .map_err(|error| PromptError::Pattern(error.clone()))
}

/// Fills `template` with the request and the prepped directory text.
pub fn build_prompt(
    template: &str,
    user_request: &str,
    prepped_dir_content: &str,
) -> Result<String, PromptError> {
    let mut prompt = String::with_capacity(template.len() + prepped_dir_content.len());
    let mut last = 0;

    for captures in token_pattern()?.captures_iter(template) {
        let Some(token) = captures.get(0) else {
            continue;
        };
        prompt.push_str(&template[last..token.start()]);
        last = token.end();

        match (token.as_str(), captures.get(1)) {
            ("{{", _) => prompt.push('{'),
            ("}}", _) => prompt.push('}'),
            (_, Some(name)) => match name.as_str().trim() {
                "user_request" => prompt.push_str(user_request),
                "prepped_dir_content" => prompt.push_str(prepped_dir_content),
                other => {
                    return Err(PromptError::UnknownPlaceholder {
                        name: other.to_string(),
                    })
                }
            },
            (brace, None) => {
                return Err(PromptError::UnmatchedBrace {
                    brace: brace.chars().next().unwrap_or('{'),
                    offset: token.start(),
                })
            }
        }
    }

    prompt.push_str(&template[last..]);
    Ok(prompt)
}

/// Reads the prepped directory file and builds the prompt from it.
pub fn build_prompt_from_file(
    template: &str,
    user_request: &str,
    prepped_dir: &Path,
) -> Result<String, PromptError> {
    let content = fs::read_to_string(prepped_dir)
        .map_err(|source| PromptError::io("reading prepped directory", prepped_dir, source))?;
    build_prompt(template, user_request, &content)
}

pub fn validate_response(content: &str) -> Result<(), PromptError> {
    if FILE_MARKERS.iter().all(|marker| content.contains(marker)) {
        Ok(())
    } else {
        Err(PromptError::MissingMarkers)
    }
}

/// Writes a validated reply to `output`.
pub fn save_output(content: &str, output: &Path) -> Result<(), PromptError> {
    validate_response(content)?;
    fs::write(output, content)
        .map_err(|source| PromptError::io("saving LLM output", output, source))?;
    info!(path = %output.display(), "saved output");
    Ok(())
}

/// The block shown when the prompt is copied to a chat window by hand.
#[must_use]
pub fn manual_instructions(prompt: &str, output: &Path) -> String {
    format!(
        "=== Prompt for LLM ===\n{prompt}\n=== End Prompt ===\n\
         Please save the LLM's output as {}\n",
        output.display()
    )
}
