use std::io::{self, BufRead, Write};

use session_store::{Role, SessionStore, SessionStoreError, Transcript};
use tracing::{debug, warn};

use crate::commands::{parse_slash_command, SlashCommand, HELP};

/// Writes the history with indices, then the pending draft.
pub fn write_transcript<W: Write>(transcript: &Transcript, out: &mut W) -> io::Result<()> {
    if transcript.history.is_empty() {
        writeln!(out, "(no messages)")?;
    }

    for (index, message) in transcript.history.iter().enumerate() {
        let timestamp = message.timestamp().unwrap_or("-");
        match message.model() {
            Some(model) => writeln!(out, "[{index}] {} ({model}) {timestamp}", message.role())?,
            None => writeln!(out, "[{index}] {} {timestamp}", message.role())?,
        }
        writeln!(out, "{}", message.content())?;
        writeln!(out)?;
    }

    let draft = transcript.pending_content();
    if draft.is_empty() {
        writeln!(out, "pending: (empty)")
    } else {
        writeln!(out, "pending:")?;
        writeln!(out, "{draft}")
    }
}

/// Moves a non-empty pending draft into history as a user message.
///
/// Returns `false` when there was nothing to submit.
pub fn submit_pending(store: &SessionStore) -> Result<bool, SessionStoreError> {
    let transcript = store.parse()?;
    let draft = transcript.pending_content().trim();
    if draft.is_empty() {
        return Ok(false);
    }

    store.append_message(Role::User, draft, store.default_model())?;
    Ok(true)
}

/// Line-oriented session loop.
///
/// Plain lines become user messages; lines starting with `/` are commands.
pub struct App {
    store: SessionStore,
    pub should_exit: bool,
}

impl App {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            should_exit: false,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        self.store.init_file().map_err(io::Error::other)?;
        writeln!(out, "session: {}", self.store.path().display())?;
        writeln!(out, "type /help for commands")?;

        for line in input.lines() {
            self.on_line(&line?, &mut out)?;
            if self.should_exit {
                break;
            }
        }

        out.flush()
    }

    /// Handles one input line. Store failures are reported to `out` and the
    /// loop carries on.
    pub fn on_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<()> {
        let result = match parse_slash_command(line) {
            Some(command) => self.on_command(command),
            None => self.on_message(line).map(|()| String::new()),
        };

        match result {
            Ok(reply) => out.write_all(reply.as_bytes()),
            Err(error) => {
                warn!(%error, "session command failed");
                writeln!(out, "error: {error}")
            }
        }
    }

    fn on_message(&mut self, line: &str) -> Result<(), SessionStoreError> {
        let text = line.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.store
            .append_message(Role::User, text, self.store.default_model())?;
        debug!(chars = text.len(), "submitted user message");
        Ok(())
    }

    fn on_command(&mut self, command: SlashCommand) -> Result<String, SessionStoreError> {
        let reply = match command {
            SlashCommand::Help => format!("{HELP}\n"),
            SlashCommand::Show => {
                let mut rendered = Vec::new();
                write_transcript(&self.store.parse()?, &mut rendered).map_err(|source| {
                    SessionStoreError::io("rendering transcript", self.store.path(), source)
                })?;
                String::from_utf8_lossy(&rendered).into_owned()
            }
            SlashCommand::Pending(text) => {
                self.store.write_pending(&text)?;
                "pending draft updated\n".to_string()
            }
            SlashCommand::Remove(index) => {
                if self.store.remove_message(index)? {
                    format!("removed message {index}\n")
                } else {
                    format!("no message at index {index}\n")
                }
            }
            SlashCommand::Quit => {
                self.should_exit = true;
                String::new()
            }
            SlashCommand::Usage(usage) => format!("usage: {usage}\n"),
            SlashCommand::Unknown(command) => format!("unknown command: {command} (try /help)\n"),
        };
        Ok(reply)
    }
}
