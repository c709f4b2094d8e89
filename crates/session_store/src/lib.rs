//! Markdown session file store for vibedir prompts.
//!
//! A session file holds the finalized conversation turns followed by a single
//! editable pending draft. [`SessionStore`] is the only component that writes
//! it.

mod clock;
mod error;
mod header;
mod message;
mod paths;
mod store;

pub use clock::{message_timestamp, session_timestamp};
pub use error::SessionStoreError;
pub use header::{session_header, HeaderGrammar, HeaderMatch, SESSION_HEADER_PREFIX};
pub use message::{
    validate_model_label, Message, PromptIcons, Role, DEFAULT_ASSISTANT_ICON, DEFAULT_USER_ICON,
    PENDING_LABEL,
};
pub use paths::{default_session_path, session_root, SESSION_DIR, SESSION_FILE_NAME};
pub use store::{SessionStore, Transcript, DEFAULT_MODEL_LABEL};
