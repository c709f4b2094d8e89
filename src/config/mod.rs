//! Layered TOML configuration.
//!
//! Layers are merged lowest precedence first:
//! 1. Bundled defaults (compiled in, `vibedir` namespace only)
//! 2. User-level: `~/.{namespace}/config.toml`
//! 3. Workspace-level: `<cwd>/.{namespace}/config.toml`
//!
//! A custom path replaces layers 2 and 3. See [`merge::merge_tables`] for how
//! values combine.

mod env;
mod error;
mod merge;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use toml::Table;
use toml_edit::{DocumentMut, Item, TableLike};
use tracing::{debug, info};

pub use env::EnvConfig;
pub use error::ConfigError;
pub use merge::merge_tables;
pub use settings::{
    CommandSettings, LlmSettings, LoggingSettings, PromptIconSettings, Settings,
};

pub const DEFAULT_NAMESPACE: &str = "vibedir";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const BUNDLED_CONFIG: &str = include_str!("default.toml");
const BUNDLED_SOURCE: &str = "<bundled config.toml>";

/// Namespaces become directory names, so they must be plain identifiers.
pub fn check_namespace_value(namespace: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidNamespace {
        namespace: namespace.to_string(),
        reason,
    };

    let mut chars = namespace.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("must be non-empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or underscore"));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("must contain only letters, digits and underscores"));
    }

    Ok(())
}

#[must_use]
pub fn config_path_from_root(root: &Path, namespace: &str) -> PathBuf {
    root.join(format!(".{namespace}")).join(CONFIG_FILE_NAME)
}

/// Returns the home (when a home directory is known) and local config paths.
pub fn home_and_local_config_path(
    namespace: &str,
    cwd: &Path,
) -> Result<(Option<PathBuf>, PathBuf), ConfigError> {
    check_namespace_value(namespace)?;
    let home = dirs::home_dir().map(|home| config_path_from_root(&home, namespace));
    Ok((home, config_path_from_root(cwd, namespace)))
}

pub fn bundled_config(namespace: &str) -> Result<&'static str, ConfigError> {
    if namespace == DEFAULT_NAMESPACE {
        Ok(BUNDLED_CONFIG)
    } else {
        Err(ConfigError::NoBundledConfig {
            namespace: namespace.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub custom_path: Option<PathBuf>,
    pub skip_file_load: bool,
    pub skip_bundled: bool,
}

impl LoadOptions {
    #[must_use]
    pub fn from_env(env: &EnvConfig) -> Self {
        Self {
            custom_path: None,
            skip_file_load: env.skip_config_file_load,
            skip_bundled: env.skip_bundled_config_load,
        }
    }

    #[must_use]
    pub fn with_custom_path(mut self, path: Option<PathBuf>) -> Self {
        self.custom_path = path;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Bundled,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub table: Table,
    pub sources: Vec<ConfigSource>,
}

impl LoadedConfig {
    /// Looks up a dotted key such as `llm.model` in the merged table.
    #[must_use]
    pub fn get(&self, dotted_key: &str) -> Option<&toml::Value> {
        let mut parts = dotted_key.split('.');
        let mut value = self.table.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }
}

pub fn load_config(
    namespace: &str,
    cwd: &Path,
    options: &LoadOptions,
) -> Result<LoadedConfig, ConfigError> {
    check_namespace_value(namespace)?;
    let mut table = Table::new();
    let mut sources = Vec::new();

    if !options.skip_bundled {
        match bundled_config(namespace) {
            Ok(content) => {
                merge_tables(&mut table, parse_table(Path::new(BUNDLED_SOURCE), content)?);
                sources.push(ConfigSource::Bundled);
                debug!(namespace, "merged bundled default config");
            }
            Err(error) => debug!(%error, "skipping bundled config"),
        }
    }

    for path in file_layers(namespace, cwd, options)? {
        let content = fs::read_to_string(&path)
            .map_err(|source| ConfigError::io("reading config file", &path, source))?;
        merge_tables(&mut table, parse_table(&path, &content)?);
        info!(path = %path.display(), "loaded config");
        sources.push(ConfigSource::File(path));
    }

    if sources.is_empty() {
        debug!(namespace, "no config layers found; using built-in defaults");
    }

    let settings = toml::Value::Table(table.clone())
        .try_into::<Settings>()
        .map_err(ConfigError::Invalid)?;

    Ok(LoadedConfig {
        settings,
        table,
        sources,
    })
}

fn file_layers(
    namespace: &str,
    cwd: &Path,
    options: &LoadOptions,
) -> Result<Vec<PathBuf>, ConfigError> {
    if let Some(custom) = &options.custom_path {
        let path = cwd.join(custom);
        if !path.is_file() {
            return Err(ConfigError::MissingCustomPath { path });
        }
        info!(path = %path.display(), "using custom config");
        return Ok(vec![path]);
    }

    if options.skip_file_load {
        return Ok(Vec::new());
    }

    let (home, local) = home_and_local_config_path(namespace, cwd)?;
    let mut layers: Vec<PathBuf> = home.into_iter().collect();
    if !layers.contains(&local) {
        layers.push(local);
    }
    Ok(layers.into_iter().filter(|path| path.is_file()).collect())
}

fn parse_table(path: &Path, content: &str) -> Result<Table, ConfigError> {
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies dotted-key `updates` to a TOML file, keeping its comments and
/// layout. Defaults to the local config path; a missing file starts from the
/// bundled defaults.
pub fn save_config(
    namespace: &str,
    cwd: &Path,
    updates: &[(&str, toml_edit::Value)],
    target: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    check_namespace_value(namespace)?;
    let path = match target {
        Some(target) => cwd.join(target),
        None => config_path_from_root(cwd, namespace),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| ConfigError::io("creating config directory", parent, source))?;
    }

    let (content, source_path) = if path.is_file() {
        let content = fs::read_to_string(&path)
            .map_err(|source| ConfigError::io("reading config file", &path, source))?;
        (content, path.clone())
    } else {
        info!(path = %path.display(), "creating new config file");
        (bundled_config(namespace)?.to_string(), PathBuf::from(BUNDLED_SOURCE))
    };

    let mut document = content
        .parse::<DocumentMut>()
        .map_err(|source| ConfigError::Edit {
            path: source_path,
            source,
        })?;

    for (key, value) in updates {
        set_dotted(&mut document, key, value.clone())?;
    }

    fs::write(&path, document.to_string())
        .map_err(|source| ConfigError::io("writing config file", &path, source))?;
    info!(path = %path.display(), updates = updates.len(), "config saved");
    Ok(path)
}

fn set_dotted(
    document: &mut DocumentMut,
    key_path: &str,
    value: toml_edit::Value,
) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidKey {
        key: key_path.to_string(),
    };
    let parts: Vec<&str> = key_path.split('.').map(str::trim).collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(invalid());
    }
    let Some((last, parents)) = parts.split_last() else {
        return Err(invalid());
    };

    let mut current: &mut dyn TableLike = document.as_table_mut();
    for part in parents {
        let needs_table = current
            .get(part)
            .map_or(true, |item| !item.is_table_like());
        if needs_table {
            current.insert(part, toml_edit::table());
        }
        current = current
            .get_mut(part)
            .and_then(Item::as_table_like_mut)
            .ok_or_else(invalid)?;
    }

    // Assigning in place keeps the key's leading comments and spacing.
    match current.get_mut(last) {
        Some(item) if item.is_value() => {
            let decor = item.as_value().map(|existing| existing.decor().clone());
            *item = toml_edit::value(value);
            if let (Some(decor), Some(updated)) = (decor, item.as_value_mut()) {
                *updated.decor_mut() = decor;
            }
        }
        Some(item) => *item = toml_edit::value(value),
        None => {
            current.insert(last, toml_edit::value(value));
        }
    }
    Ok(())
}

/// Writes the bundled defaults to `target` (or the local config path).
pub fn init_config(
    namespace: &str,
    cwd: &Path,
    target: Option<&Path>,
    force: bool,
) -> Result<PathBuf, ConfigError> {
    check_namespace_value(namespace)?;
    let path = match target {
        Some(target) => cwd.join(target),
        None => config_path_from_root(cwd, namespace),
    };

    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }

    let content = bundled_config(namespace)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| ConfigError::io("creating config directory", parent, source))?;
    }
    fs::write(&path, content)
        .map_err(|source| ConfigError::io("writing config file", &path, source))?;
    info!(path = %path.display(), "initialized config");
    Ok(path)
}
