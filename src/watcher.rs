//! Session file change notifications.
//!
//! The store never watches its own file; front ends that want to reload on
//! external edits start a [`SessionWatcher`] and re-parse in the callback.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create file watcher: {0}")]
    Create(#[source] notify::Error),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Keeps the underlying watch alive; dropping it stops notifications and
/// lets the callback thread exit.
pub struct SessionWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl SessionWatcher {
    /// Watches the directory holding `session_path` (so editors that replace
    /// the file are still seen) and calls `on_change` on a background thread
    /// once per burst of events touching the file.
    pub fn start<F>(session_path: &Path, debounce: Duration, on_change: F) -> Result<Self, WatchError>
    where
        F: Fn() + Send + 'static,
    {
        let path = session_path.to_path_buf();
        let directory = watch_directory(&path);
        let (tx, rx) = mpsc::channel();

        let target = path.clone();
        let mut watcher = notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
            match result {
                Ok(event) if is_relevant(&event, &target) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "session watcher error"),
            }
        })
        .map_err(WatchError::Create)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: directory.clone(),
                source,
            })?;

        thread::spawn(move || {
            let mut last_change: Option<Instant> = None;
            while rx.recv().is_ok() {
                if let Some(last) = last_change {
                    let elapsed = last.elapsed();
                    if elapsed < debounce {
                        thread::sleep(debounce - elapsed);
                    }
                }
                while rx.try_recv().is_ok() {}

                last_change = Some(Instant::now());
                on_change();
            }
            tracing::debug!("session watcher thread exiting");
        });

        tracing::info!(path = %path.display(), "watching session file");
        Ok(Self {
            _watcher: watcher,
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn watch_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn is_relevant(event: &Event, target: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|path| same_file_name(path, target))
}

fn same_file_name(path: &Path, target: &Path) -> bool {
    path == target || (path.file_name().is_some() && path.file_name() == target.file_name())
}
