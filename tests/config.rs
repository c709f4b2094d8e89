use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vibedir::config::{
    bundled_config, home_and_local_config_path, init_config, load_config, save_config,
    ConfigError, ConfigSource, LoadOptions,
};

static HOME_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct HomeGuard {
    _lock: MutexGuard<'static, ()>,
    previous: Option<String>,
    _home: TempDir,
    path: PathBuf,
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(home) => env::set_var("HOME", home),
            None => env::remove_var("HOME"),
        }
    }
}

fn isolated_home() -> HomeGuard {
    let lock = match HOME_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let previous = env::var("HOME").ok();
    let home = TempDir::new().expect("temp home");
    let path = home.path().to_path_buf();
    env::set_var("HOME", &path);
    HomeGuard {
        _lock: lock,
        previous,
        _home: home,
        path,
    }
}

fn write_config(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config dir");
    }
    fs::write(path, contents).expect("write config");
}

fn home_config(home: &HomeGuard) -> PathBuf {
    home.path.join(".vibedir").join("config.toml")
}

fn local_config(cwd: &Path) -> PathBuf {
    cwd.join(".vibedir").join("config.toml")
}

fn command_names(config: &vibedir::LoadedConfig) -> Vec<String> {
    config
        .settings
        .commands
        .iter()
        .map(|command| command.name.clone())
        .collect()
}

#[test]
fn falls_back_to_bundled_defaults() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");

    let config = load_config("vibedir", cwd.path(), &LoadOptions::default()).expect("load");

    assert_eq!(config.sources, vec![ConfigSource::Bundled]);
    assert_eq!(config.settings.mode, "clipboard");
    assert_eq!(config.settings.llm.model, "grok-4");
    assert_eq!(config.settings.clipboard_max_chars_per_file, 40_000);
    assert_eq!(config.settings.prompt_icons.user, "👤");
    assert_eq!(config.get("llm.model").and_then(|v| v.as_str()), Some("grok-4"));
    assert!(config.get("llm.missing").is_none());
}

#[test]
fn local_overrides_home_which_overrides_bundled() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(
        &home_config(&home),
        r#"
mode = "clipboard"
clipboard_max_chars_per_file = 30000
llm.model = "grok-beta"
auto_commit = "off"
"#,
    );
    write_config(
        &local_config(cwd.path()),
        r#"
mode = "api"
clipboard_max_chars_per_file = 99999
ask_llm_for_commit_message = false
"#,
    );

    let config = load_config("vibedir", cwd.path(), &LoadOptions::default()).expect("load");
    let settings = &config.settings;

    assert_eq!(settings.mode, "api");
    assert_eq!(settings.clipboard_max_chars_per_file, 99_999);
    assert!(!settings.ask_llm_for_commit_message);

    assert_eq!(settings.llm.model, "grok-beta");
    assert_eq!(settings.auto_commit, "off");

    assert!(settings.show_command_legend_in_header);
    assert_eq!(settings.prompt_icons.user, "👤");
    assert_eq!(settings.logging.level, "INFO");
    assert_eq!(config.sources.len(), 3);
}

#[test]
fn custom_path_replaces_home_and_local_layers() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(&home_config(&home), "auto_commit = \"off\"\n");
    write_config(
        &local_config(cwd.path()),
        "mode = \"clipboard\"\nllm.model = \"local-model\"\n",
    );
    let custom = cwd.path().join("myconfig.toml");
    write_config(
        &custom,
        "mode = \"api\"\nllm.model = \"claude-3\"\nclipboard_max_chars_per_file = 11111\n",
    );

    let options = LoadOptions::default().with_custom_path(Some(PathBuf::from("myconfig.toml")));
    let config = load_config("vibedir", cwd.path(), &options).expect("load");

    assert_eq!(config.settings.mode, "api");
    assert_eq!(config.settings.llm.model, "claude-3");
    assert_eq!(config.settings.clipboard_max_chars_per_file, 11_111);
    assert_eq!(config.settings.auto_commit, "ask");
    assert_eq!(
        config.sources,
        vec![ConfigSource::Bundled, ConfigSource::File(custom)]
    );
}

#[test]
fn missing_custom_path_is_an_error() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    let options = LoadOptions::default().with_custom_path(Some(PathBuf::from("nope.toml")));

    let error = load_config("vibedir", cwd.path(), &options)
        .err()
        .expect("missing custom path must fail");
    assert!(matches!(error, ConfigError::MissingCustomPath { .. }));
}

#[test]
fn arrays_of_tables_append_bundled_then_home_then_local() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(
        &home_config(&home),
        r#"
[[command]]
name = "HOME_FIRST"
command = "echo home"
run_on = ["startup"]
"#,
    );
    write_config(
        &local_config(cwd.path()),
        r#"
[[command]]
name = "LOCAL_LAST"
command = "echo local"
run_on = ["startup"]
"#,
    );

    let config = load_config("vibedir", cwd.path(), &LoadOptions::default()).expect("load");

    assert_eq!(
        command_names(&config),
        vec!["Format Code", "Lint", "Tests", "HOME_FIRST", "LOCAL_LAST"]
    );
}

#[test]
fn skip_flags_drop_layers() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(&home_config(&home), "mode = \"api\"\n");

    let skip_files = LoadOptions {
        skip_file_load: true,
        ..LoadOptions::default()
    };
    let config = load_config("vibedir", cwd.path(), &skip_files).expect("load");
    assert_eq!(config.settings.mode, "clipboard");
    assert_eq!(config.sources, vec![ConfigSource::Bundled]);

    let skip_bundled = LoadOptions {
        skip_bundled: true,
        ..LoadOptions::default()
    };
    let config = load_config("vibedir", cwd.path(), &skip_bundled).expect("load");
    assert_eq!(config.settings.mode, "api");
    assert!(config.settings.commands.is_empty());
}

#[test]
fn other_namespaces_load_without_bundled_defaults() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(
        &home.path.join(".myapp").join("config.toml"),
        "mode = \"api\"\n",
    );

    let config = load_config("myapp", cwd.path(), &LoadOptions::default()).expect("load");
    assert_eq!(config.settings.mode, "api");
    assert_eq!(config.sources.len(), 1);
}

#[test]
fn invalid_toml_reports_the_file() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    let local = local_config(cwd.path());
    write_config(&local, "mode = \n");

    let error = load_config("vibedir", cwd.path(), &LoadOptions::default())
        .err()
        .expect("invalid toml must fail");
    assert!(matches!(error, ConfigError::Parse { ref path, .. } if *path == local));
}

#[test]
fn wrongly_typed_value_is_rejected() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    write_config(
        &local_config(cwd.path()),
        "clipboard_max_chars_per_file = \"lots\"\n",
    );

    let error = load_config("vibedir", cwd.path(), &LoadOptions::default())
        .err()
        .expect("wrong type must fail");
    assert!(matches!(error, ConfigError::Invalid(_)));
}

#[test]
fn home_and_local_paths_follow_namespace() {
    let home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");

    let (home_path, local_path) =
        home_and_local_config_path("vibedir", cwd.path()).expect("valid namespace");
    assert_eq!(home_path, Some(home_config(&home)));
    assert_eq!(local_path, local_config(cwd.path()));

    assert!(matches!(
        home_and_local_config_path("invalid name", cwd.path()),
        Err(ConfigError::InvalidNamespace { .. })
    ));
}

#[test]
fn init_config_writes_bundled_defaults_and_refuses_overwrite() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");

    let path = init_config("vibedir", cwd.path(), None, false).expect("init");
    assert_eq!(path, local_config(cwd.path()));
    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        bundled_config("vibedir").expect("bundled")
    );

    let error = init_config("vibedir", cwd.path(), None, false)
        .err()
        .expect("second init must fail");
    assert!(matches!(error, ConfigError::AlreadyExists { .. }));

    fs::write(&path, "mode = \"api\"\n").expect("overwrite");
    init_config("vibedir", cwd.path(), None, true).expect("forced init");
    assert!(fs::read_to_string(&path)
        .expect("read")
        .contains("mode = \"clipboard\""));
}

#[test]
fn save_config_creates_local_file_from_bundled_defaults() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    assert!(!local_config(cwd.path()).exists());

    let saved = save_config(
        "vibedir",
        cwd.path(),
        &[
            ("mode", "api".into()),
            ("clipboard_max_chars_per_file", 12345i64.into()),
        ],
        None,
    )
    .expect("save");

    assert_eq!(saved, local_config(cwd.path()));
    let config = load_config("vibedir", cwd.path(), &LoadOptions::default()).expect("load");
    assert_eq!(config.settings.mode, "api");
    assert_eq!(config.settings.clipboard_max_chars_per_file, 12_345);
    assert_eq!(config.settings.llm.model, "grok-4");
}

#[test]
fn save_config_preserves_comments() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    let path = init_config("vibedir", cwd.path(), None, false).expect("init");
    assert!(fs::read_to_string(&path)
        .expect("read")
        .contains("# The mode determines"));

    save_config("vibedir", cwd.path(), &[("mode", "api".into())], None).expect("save");

    let updated = fs::read_to_string(&path).expect("read");
    assert!(updated.contains("# The mode determines"));
    assert!(updated.contains("mode = \"api\""));
}

#[test]
fn save_config_creates_nested_tables_for_dotted_keys() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    let target = cwd.path().join("custom.toml");
    write_config(&target, "# mine\nmode = \"clipboard\"\nllm = { model = \"grok-4\", temperature = 0.2 }\n");

    save_config(
        "vibedir",
        cwd.path(),
        &[
            ("llm.model", "claude-3".into()),
            ("editor.keys.submit", "ctrl+enter".into()),
            ("auto_commit", "latest".into()),
        ],
        Some(Path::new("custom.toml")),
    )
    .expect("save");

    let document: toml::Table = fs::read_to_string(&target)
        .expect("read")
        .parse()
        .expect("saved file should parse");
    assert_eq!(document["llm"]["model"].as_str(), Some("claude-3"));
    assert_eq!(document["llm"]["temperature"].as_float(), Some(0.2));
    assert_eq!(document["editor"]["keys"]["submit"].as_str(), Some("ctrl+enter"));
    assert_eq!(document["auto_commit"].as_str(), Some("latest"));
}

#[test]
fn save_config_rejects_empty_key_segments() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");

    let error = save_config("vibedir", cwd.path(), &[("llm..model", "x".into())], None)
        .err()
        .expect("empty segment must fail");
    assert!(matches!(error, ConfigError::InvalidKey { .. }));
}

#[test]
fn save_config_keeps_comments_attached_to_updated_keys() {
    let _home = isolated_home();
    let cwd = TempDir::new().expect("temp cwd");
    let target = cwd.path().join("commented.toml");
    write_config(
        &target,
        "# pick a mode\nmode = \"clipboard\" # or api\n\n[llm]\n# which model answers\nmodel = \"grok-4\"\n",
    );

    save_config(
        "vibedir",
        cwd.path(),
        &[("mode", "api".into()), ("llm.model", "claude-3".into())],
        Some(Path::new("commented.toml")),
    )
    .expect("save");

    let updated = fs::read_to_string(&target).expect("read");
    assert!(updated.contains("# pick a mode\nmode = \"api\""), "{updated}");
    assert!(updated.contains("# or api"), "{updated}");
    assert!(updated.contains("# which model answers\nmodel = \"claude-3\""), "{updated}");
}
