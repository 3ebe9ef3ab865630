//! Centralized path resolution for zbxsync
//!
//! The config directory is resolved in priority order:
//! 1. `ZBXSYNC_CONFIG_DIR` env var
//! 2. `XDG_CONFIG_HOME/zbxsync`
//! 3. `~/.config/zbxsync`
//!
//! An explicit `--config` file (or `ZBXSYNC_CONFIG`) bypasses all of this.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable to override the config directory
pub const ENV_CONFIG_DIR: &str = "ZBXSYNC_CONFIG_DIR";

/// File name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the zbxsync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        let path = PathBuf::from(xdg_config).join("zbxsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("zbxsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Default config file location
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand `~` and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring the previous value after.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: only the tests in this module touch these variables
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: as above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/zbxsync", || {
            assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/zbxsync"));
            assert_eq!(
                config_file().unwrap(),
                PathBuf::from("/custom/zbxsync/config.toml")
            );
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand("~/zbx/config.toml"), home.join("zbx").join("config.toml"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/etc/zbxsync.toml"), PathBuf::from("/etc/zbxsync.toml"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        assert_eq!(
            expand("/path/$ZBXSYNC_NONEXISTENT_12345/file"),
            PathBuf::from("/path/$ZBXSYNC_NONEXISTENT_12345/file")
        );
    }
}
