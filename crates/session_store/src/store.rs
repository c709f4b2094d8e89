use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::clock;
use crate::error::SessionStoreError;
use crate::header::{session_header, HeaderGrammar, HeaderMatch};
use crate::message::{validate_model_label, Message, PromptIcons, Role};

/// Model label used for assistant headers when none is known.
pub const DEFAULT_MODEL_LABEL: &str = "grok-4";

/// Parsed view of a session file: finalized turns in file order plus the
/// editable draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub history: Vec<Message>,
    pub pending: Option<Message>,
}

impl Transcript {
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Option<Message>) {
        (self.history, self.pending)
    }

    #[must_use]
    pub fn pending_content(&self) -> &str {
        self.pending.as_ref().map_or("", Message::content)
    }
}

#[derive(Debug)]
struct ScannedBlock {
    offset: u64,
    message: Message,
}

/// Sole reader and writer of one session file.
///
/// Every operation reads the file from scratch and closes it before
/// returning; callers with several writers must serialize calls themselves.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    icons: PromptIcons,
    grammar: HeaderGrammar,
    default_model: String,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, icons: PromptIcons) -> Result<Self, SessionStoreError> {
        let grammar = HeaderGrammar::new(&icons)?;
        Ok(Self {
            path: path.into(),
            icons,
            grammar,
            default_model: DEFAULT_MODEL_LABEL.to_string(),
        })
    }

    /// Overrides the label used when re-rendering assistant turns whose
    /// header carried no recoverable model.
    pub fn with_default_model(
        mut self,
        model: impl Into<String>,
    ) -> Result<Self, SessionStoreError> {
        let model = model.into();
        validate_model_label(&model)?;
        self.default_model = model;
        Ok(self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn icons(&self) -> &PromptIcons {
        &self.icons
    }

    #[must_use]
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Reads the file into history and pending.
    ///
    /// A missing file yields an empty transcript. An existing file without a
    /// pending block gets one appended, then is read exactly once more.
    pub fn parse(&self) -> Result<Transcript, SessionStoreError> {
        let Some(bytes) = self.read()? else {
            return Ok(Transcript::default());
        };

        let transcript = self.partition(self.scan(&bytes));
        if transcript.pending.is_some() {
            return Ok(transcript);
        }

        debug!(path = %self.path.display(), "session file has no pending block; appending one");
        let block = Message::pending("").render(&self.icons, &self.default_model)?;
        self.append_raw(Some(bytes.as_slice()), None, &block)?;

        let Some(bytes) = self.read()? else {
            return Err(SessionStoreError::PendingRepairFailed {
                path: self.path.clone(),
            });
        };
        let transcript = self.partition(self.scan(&bytes));
        if transcript.pending.is_none() {
            return Err(SessionStoreError::PendingRepairFailed {
                path: self.path.clone(),
            });
        }

        Ok(transcript)
    }

    /// Rewrites the whole file with the current history and `text` as the
    /// pending draft.
    pub fn write_pending(&self, text: &str) -> Result<(), SessionStoreError> {
        let history = self.parse()?.history;
        let pending = Message::pending(text);
        self.rewrite(&history, Some(&pending))?;
        debug!(
            path = %self.path.display(),
            history = history.len(),
            "rewrote pending draft"
        );
        Ok(())
    }

    /// Appends a stamped user or assistant turn followed by a fresh empty
    /// pending block.
    ///
    /// Content ahead of the trailing pending block is never rewritten; the
    /// trailing pending block itself is dropped so the file keeps a single
    /// pending slot.
    pub fn append_message(
        &self,
        role: Role,
        content: &str,
        model_label: &str,
    ) -> Result<(), SessionStoreError> {
        if role == Role::Pending {
            return Err(SessionStoreError::PendingAppend {
                path: self.path.clone(),
            });
        }
        if role == Role::Assistant {
            validate_model_label(model_label)?;
        }

        let existing = self.read()?;
        let mut buffer = String::new();
        let truncate_at = match &existing {
            None => {
                buffer.push_str(&session_header(&clock::session_timestamp(clock::now())?));
                None
            }
            Some(bytes) => self
                .scan(bytes)
                .last()
                .filter(|block| block.message.is_pending())
                .map(|block| block.offset),
        };

        let message = Message::new(role, Some(clock::message_timestamp_now()?), content);
        buffer.push_str(&message.render(&self.icons, model_label)?);
        buffer.push_str(&Message::pending("").render(&self.icons, model_label)?);

        self.append_raw(existing.as_deref(), truncate_at, &buffer)?;
        debug!(path = %self.path.display(), %role, "appended message");
        Ok(())
    }

    /// Deletes the history entry at `index` and rewrites the file.
    ///
    /// An out-of-range index leaves the file untouched and returns
    /// `Ok(false)`.
    pub fn remove_message(&self, index: usize) -> Result<bool, SessionStoreError> {
        let Transcript {
            mut history,
            pending,
        } = self.parse()?;

        if index >= history.len() {
            debug!(
                path = %self.path.display(),
                index,
                history = history.len(),
                "remove_message index out of range; ignoring"
            );
            return Ok(false);
        }

        let removed = history.remove(index);
        self.rewrite(&history, pending.as_ref())?;
        debug!(path = %self.path.display(), index, role = %removed.role(), "removed message");
        Ok(true)
    }

    /// Creates the file with a session header and an empty pending block.
    /// Does nothing when the file already exists.
    pub fn init_file(&self) -> Result<(), SessionStoreError> {
        if self.path.exists() {
            return Ok(());
        }

        let mut buffer = session_header(&clock::session_timestamp(clock::now())?);
        buffer.push_str(&Message::pending("").render(&self.icons, &self.default_model)?);
        fs::write(&self.path, buffer).map_err(|source| {
            SessionStoreError::io("creating session file", &self.path, source)
        })?;
        debug!(path = %self.path.display(), "initialized session file");
        Ok(())
    }

    fn read(&self) -> Result<Option<Vec<u8>>, SessionStoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionStoreError::io(
                "reading session file",
                &self.path,
                source,
            )),
        }
    }

    /// Splits raw bytes into header-delimited blocks. Offsets are byte
    /// positions of each header line in the file. Invalid UTF-8 is decoded
    /// lossily, so scanning never fails.
    fn scan(&self, bytes: &[u8]) -> Vec<ScannedBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<(u64, HeaderMatch)> = None;
        let mut content: Vec<String> = Vec::new();
        let mut offset = 0u64;

        for raw_line in bytes.split_inclusive(|byte| *byte == b'\n') {
            let line_offset = offset;
            offset += raw_line.len() as u64;

            let decoded = String::from_utf8_lossy(raw_line);
            let line: &str = &decoded;
            let line = line.strip_suffix('\n').unwrap_or(line);
            let line = line.strip_suffix('\r').unwrap_or(line);

            if let Some(header) = self.grammar.match_line(line) {
                if let Some((start, previous)) = current.take() {
                    blocks.push(close_block(start, previous, &content));
                }
                current = Some((line_offset, header));
                content.clear();
                continue;
            }

            content.push(line.to_string());
        }

        if let Some((start, previous)) = current {
            blocks.push(close_block(start, previous, &content));
        }

        blocks
    }

    fn partition(&self, blocks: Vec<ScannedBlock>) -> Transcript {
        let mut transcript = Transcript::default();
        let mut pending_blocks = 0usize;

        for block in blocks {
            if block.message.is_pending() {
                pending_blocks += 1;
                transcript.pending = Some(block.message);
            } else {
                transcript.history.push(block.message);
            }
        }

        if pending_blocks > 1 {
            warn!(
                path = %self.path.display(),
                pending_blocks,
                "session file holds more than one pending block; keeping the last"
            );
        }

        transcript
    }

    fn rewrite(
        &self,
        history: &[Message],
        pending: Option<&Message>,
    ) -> Result<(), SessionStoreError> {
        let mut buffer = session_header(&clock::session_timestamp(clock::now())?);
        for message in history {
            let model = message.model().unwrap_or(&self.default_model);
            buffer.push_str(&message.render(&self.icons, model)?);
        }
        if let Some(pending) = pending {
            buffer.push_str(&pending.render(&self.icons, &self.default_model)?);
        }

        fs::write(&self.path, buffer).map_err(|source| {
            SessionStoreError::io("rewriting session file", &self.path, source)
        })
    }

    /// Appends `text`, optionally truncating the file to `truncate_at` first.
    /// A newline is inserted when the retained content does not end in one.
    fn append_raw(
        &self,
        existing: Option<&[u8]>,
        truncate_at: Option<u64>,
        text: &str,
    ) -> Result<(), SessionStoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| {
                SessionStoreError::io("opening session file for append", &self.path, source)
            })?;

        let retained = match (existing, truncate_at) {
            (Some(bytes), Some(offset)) => {
                file.set_len(offset).map_err(|source| {
                    SessionStoreError::io("truncating pending block", &self.path, source)
                })?;
                usize::try_from(offset)
                    .ok()
                    .and_then(|offset| bytes.get(..offset))
                    .unwrap_or(bytes)
            }
            (Some(bytes), None) => bytes,
            (None, _) => &[],
        };

        let mut output = String::with_capacity(text.len() + 1);
        if retained.last().is_some_and(|byte| *byte != b'\n') {
            output.push('\n');
        }
        output.push_str(text);

        file.write_all(output.as_bytes()).map_err(|source| {
            SessionStoreError::io("appending to session file", &self.path, source)
        })
    }
}

fn close_block(offset: u64, header: HeaderMatch, content: &[String]) -> ScannedBlock {
    let message = Message::new(header.role, header.timestamp, content.join("\n").trim())
        .with_model(header.model);
    ScannedBlock { offset, message }
}
