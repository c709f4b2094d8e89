//! Process-wide environment guards shared by unit tests.

use std::env;
use std::sync::{Mutex, MutexGuard, OnceLock};

pub(crate) struct EnvGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(value) = &self.previous {
            env::set_var(self.key, value);
        } else {
            env::remove_var(self.key);
        }
    }
}

pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    match LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
    let previous = env::var(key).ok();
    if let Some(value) = value {
        env::set_var(key, value);
    } else {
        env::remove_var(key);
    }
    EnvGuard { key, previous }
}
