//! Where Quill keeps its files.
//!
//! Everything lives in one `quill` directory under the platform config dir
//! (`$XDG_CONFIG_HOME` or `~/.config` on Linux, `~/Library/Application
//! Support` on macOS, `%APPDATA%` on Windows). Resolving a path never touches
//! the filesystem; writers create the parent directory themselves.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "quill";
const CONFIG_FILE: &str = "config.toml";
const PREFS_FILE: &str = "prefs.sqlite";

/// The Quill directory inside the platform config dir
pub fn quill_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(app_dir_in(&base))
}

fn app_dir_in(base: &Path) -> PathBuf {
    base.join(APP_DIR)
}

/// `<config dir>/quill/config.toml`
pub fn config_path() -> Result<PathBuf> {
    Ok(quill_dir()?.join(CONFIG_FILE))
}

/// `<config dir>/quill/prefs.sqlite`
pub fn prefs_path() -> Result<PathBuf> {
    Ok(quill_dir()?.join(PREFS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolving_does_not_create_directory() {
        let base = tempdir().unwrap();
        let dir = app_dir_in(base.path());
        assert_eq!(dir, base.path().join("quill"));
        assert!(!dir.exists());
    }

    #[test]
    fn test_files_share_one_directory() {
        if let (Ok(config), Ok(prefs)) = (config_path(), prefs_path()) {
            assert_eq!(config.parent(), prefs.parent());
            assert!(config.ends_with("quill/config.toml"));
        }
    }
}
