use std::path::{Path, PathBuf};

pub const SESSION_DIR: &str = ".vibedir";
pub const SESSION_FILE_NAME: &str = "prompt.md";

#[must_use]
pub fn session_root(cwd: &Path) -> PathBuf {
    cwd.join(SESSION_DIR)
}

#[must_use]
pub fn default_session_path(cwd: &Path) -> PathBuf {
    session_root(cwd).join(SESSION_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::default_session_path;
    use std::path::Path;

    #[test]
    fn default_session_path_lives_under_dot_vibedir() {
        assert_eq!(
            default_session_path(Path::new("/work/project")),
            Path::new("/work/project/.vibedir/prompt.md")
        );
    }
}
