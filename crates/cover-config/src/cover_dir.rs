//! Discovery and creation of the `.cover/` project directory.
//!
//! `.cover/` holds `config.yaml` and an optional `rules/` directory of rule
//! tables. It is found by walking up from the working directory.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the project directory.
pub const COVER_DIR_NAME: &str = ".cover";

/// Environment variable that overrides discovery.
const COVER_DIR_ENV: &str = "COVER_DIR";

/// Walk up the directory tree from `start` looking for a `.cover/` directory.
///
/// The `COVER_DIR` environment variable is checked first.
///
/// ```no_run
/// use cover_config::cover_dir::find_cover_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_cover_dir(Path::new(".")) {
///     println!("Found project dir at {}", dir.display());
/// }
/// ```
pub fn find_cover_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(COVER_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;

    let mut current = start.as_path();
    loop {
        let candidate = current.join(COVER_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }

    None
}

/// Ensure a `.cover/` directory exists at (or under) `path` and return it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if directory creation fails.
pub fn ensure_cover_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let cover_dir = if path.ends_with(COVER_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(COVER_DIR_NAME)
    };

    std::fs::create_dir_all(&cover_dir)?;
    Ok(cover_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dir_in_start() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join(".cover");
        std::fs::create_dir(&cover).unwrap();

        let found = find_cover_dir(dir.path()).unwrap().canonicalize().unwrap();
        assert_eq!(found, cover.canonicalize().unwrap());
    }

    #[test]
    fn finds_dir_from_child() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join(".cover");
        std::fs::create_dir(&cover).unwrap();

        let child = dir.path().join("fleet").join("2024");
        std::fs::create_dir_all(&child).unwrap();

        let found = find_cover_dir(&child).unwrap().canonicalize().unwrap();
        assert_eq!(found, cover.canonicalize().unwrap());
    }

    #[test]
    fn ensure_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let first = ensure_cover_dir(dir.path()).unwrap();
        assert!(first.is_dir());
        assert!(first.ends_with(".cover"));

        let second = ensure_cover_dir(&first).unwrap();
        assert_eq!(first, second);
    }
}
