use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use session_store::{default_session_path, Role, SessionStore};
use tracing::info;
use vibedir::config::{init_config, load_config, save_config, EnvConfig, LoadOptions, LoadedConfig};
use vibedir::watcher::{SessionWatcher, DEFAULT_DEBOUNCE};
use vibedir::prompt::{self, DEFAULT_OUTPUT_FILE};
use vibedir::{calculate_min_context, logging, open_session, DEFAULT_NAMESPACE};

use crate::app::{submit_pending, write_transcript, App};

#[derive(Debug, Parser)]
#[command(name = "vibedir", version, about = "Markdown prompt sessions for coding with an LLM")]
pub struct Cli {
    /// Session file (defaults to ./.vibedir/prompt.md)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Custom config file; replaces the home and local config layers
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Working directory used to resolve relative paths
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the session file if it does not exist
    Init,
    /// Print the conversation and the pending draft
    Show,
    /// Append a finalized message
    Append {
        #[arg(long, value_enum, default_value_t = AppendRole::User)]
        role: AppendRole,
        /// Model label for assistant messages (defaults to llm.model)
        #[arg(long)]
        model: Option<String>,
        text: String,
    },
    /// Replace the pending draft
    Pending { text: String },
    /// Delete the history entry at INDEX
    Remove { index: usize },
    /// Move the pending draft into history as a user message
    Submit,
    /// Interactive line-oriented session
    Chat,
    /// Print the conversation whenever the session file changes
    Watch,
    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the minimum unique context size of a file
    MinContext { file: PathBuf },
    /// Build an LLM prompt from a prepped directory dump
    Prompt {
        /// Change request for the LLM
        #[arg(long)]
        request: String,
        /// Directory dump produced by prepdir
        prepped_dir: PathBuf,
        /// Where the LLM's reply is saved
        #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,
        /// Validate a saved reply and write it to --output instead of
        /// printing the prompt
        #[arg(long)]
        response: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppendRole {
    User,
    Assistant,
}

impl From<AppendRole> for Role {
    fn from(role: AppendRole) -> Self {
        match role {
            AppendRole::User => Role::User,
            AppendRole::Assistant => Role::Assistant,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write the bundled defaults to the local config file
    Init {
        #[arg(long)]
        force: bool,
        /// Target file instead of ./.vibedir/config.toml
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the merged configuration and where it came from
    Show,
    /// Set KEY=VALUE pairs in the local (or --path) config file
    Set {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(required = true, value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
}

/// Resolved process state shared by the session commands.
struct Session {
    cwd: PathBuf,
    env: EnvConfig,
    config: LoadedConfig,
}

impl Session {
    fn load(cli: &Cli, cwd: PathBuf, env: EnvConfig) -> Result<Self> {
        let options = LoadOptions::from_env(&env).with_custom_path(cli.config.clone());
        let config = load_config(DEFAULT_NAMESPACE, &cwd, &options)
            .context("failed to load configuration")?;
        Ok(Self { cwd, env, config })
    }

    fn session_path(&self, cli: &Cli) -> PathBuf {
        match cli.file.as_ref().or(self.env.session_file.as_ref()) {
            Some(path) => self.cwd.join(path),
            None => default_session_path(&self.cwd),
        }
    }

    fn open_store(&self, cli: &Cli) -> Result<SessionStore> {
        let path = self.session_path(cli);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        open_session(path, &self.config.settings).context("failed to open session store")
    }
}

pub fn resolve_cwd(cli: &Cli) -> Result<PathBuf> {
    let current = std::env::current_dir().context("failed to read current directory")?;
    Ok(match &cli.cwd {
        Some(cwd) => current.join(cwd),
        None => current,
    })
}

/// Runs `cli`. `input` feeds `chat`; everything user-facing goes to `out`.
pub fn run<R: BufRead, W: Write>(cli: &Cli, env: EnvConfig, input: R, out: &mut W) -> Result<()> {
    let cwd = resolve_cwd(cli)?;

    // Config files are edited without loading them first, so a broken file
    // can still be repaired with `config init --force`.
    match &cli.command {
        Command::Config {
            action: ConfigAction::Init { force, path },
        } => {
            logging::init_logging(&env, None)?;
            let written = init_config(DEFAULT_NAMESPACE, &cwd, path.as_deref(), *force)?;
            writeln!(out, "{}", written.display())?;
            return Ok(());
        }
        Command::Config {
            action: ConfigAction::Set { path, assignments },
        } => {
            logging::init_logging(&env, None)?;
            let written = set_config(&cwd, path.as_deref(), assignments)?;
            writeln!(out, "{}", written.display())?;
            return Ok(());
        }
        _ => {}
    }

    let session = Session::load(cli, cwd, env)?;
    logging::init_logging(&session.env, Some(&session.config.settings.logging.level))?;

    match &cli.command {
        Command::Init => {
            let store = session.open_store(cli)?;
            store.init_file()?;
            writeln!(out, "{}", store.path().display())?;
        }
        Command::Show => {
            let store = session.open_store(cli)?;
            write_transcript(&store.parse()?, out)?;
        }
        Command::Append { role, model, text } => {
            let store = session.open_store(cli)?;
            let model = model.as_deref().unwrap_or(store.default_model());
            store.append_message((*role).into(), text, model)?;
        }
        Command::Pending { text } => {
            session.open_store(cli)?.write_pending(text)?;
        }
        Command::Remove { index } => {
            if session.open_store(cli)?.remove_message(*index)? {
                writeln!(out, "removed message {index}")?;
            } else {
                writeln!(out, "no message at index {index}; nothing removed")?;
            }
        }
        Command::Submit => {
            if !submit_pending(&session.open_store(cli)?)? {
                writeln!(out, "pending draft is empty; nothing submitted")?;
            }
        }
        Command::Chat => {
            App::new(session.open_store(cli)?).run(input, out)?;
        }
        Command::Watch => watch(&session.open_store(cli)?, out)?,
        Command::Config { .. } => show_config(&session.config, out)?,
        Command::MinContext { file } => {
            let path = session.cwd.join(file);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let lines: Vec<&str> = content.lines().collect();
            writeln!(out, "{}", calculate_min_context(&lines)?)?;
        }
        Command::Prompt {
            request,
            prepped_dir,
            output,
            response,
        } => {
            let output = session.cwd.join(output);
            match response {
                Some(response) => {
                    let path = session.cwd.join(response);
                    let reply = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    prompt::save_output(&reply, &output)?;
                    writeln!(out, "saved output to {}", output.display())?;
                }
                None => {
                    let built = prompt::build_prompt_from_file(
                        &session.config.settings.prompt_template,
                        request,
                        &session.cwd.join(prepped_dir),
                    )?;
                    write!(out, "{}", prompt::manual_instructions(&built, &output))?;
                }
            }
        }
    }

    Ok(())
}

fn set_config(cwd: &Path, target: Option<&Path>, assignments: &[String]) -> Result<PathBuf> {
    let parsed = assignments
        .iter()
        .map(|assignment| parse_assignment(assignment))
        .collect::<Result<Vec<_>>>()?;
    let updates: Vec<(&str, toml_edit::Value)> = parsed
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    Ok(save_config(DEFAULT_NAMESPACE, cwd, &updates, target)?)
}

/// Splits `key=value`. The value is read as a TOML literal when it parses as
/// one (`true`, `42`, `"x"`, `[1, 2]`) and as a bare string otherwise.
pub fn parse_assignment(assignment: &str) -> Result<(String, toml_edit::Value)> {
    let Some((key, raw)) = assignment.split_once('=') else {
        bail!("expected KEY=VALUE, got '{assignment}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("missing key in '{assignment}'");
    }

    let raw = raw.trim();
    let value = raw
        .parse::<toml_edit::Value>()
        .unwrap_or_else(|_| toml_edit::Value::from(raw));
    Ok((key.to_string(), value))
}

fn show_config<W: Write>(config: &LoadedConfig, out: &mut W) -> Result<()> {
    for source in &config.sources {
        writeln!(out, "# source: {source:?}")?;
    }
    let rendered = toml::to_string(&config.table).context("failed to render configuration")?;
    write!(out, "{rendered}")?;
    Ok(())
}

fn watch<W: Write>(store: &SessionStore, out: &mut W) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let _watcher = SessionWatcher::start(store.path(), DEFAULT_DEBOUNCE, move || {
        let _ = tx.send(());
    })?;

    write_transcript(&store.parse()?, out)?;
    out.flush()?;
    while rx.recv().is_ok() {
        info!(path = %store.path().display(), "session file changed");
        writeln!(out, "----")?;
        write_transcript(&store.parse()?, out)?;
        out.flush()?;
    }
    Ok(())
}
