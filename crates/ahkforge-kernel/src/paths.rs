//! XDG Base Directory paths for ahkforge.
//!
//! | Purpose | XDG Variable | Default | ahkforge Path |
//! |---------|--------------|---------|---------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/ahkforge/config.toml` |
//! | History | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/ahkforge/history.txt` |

use std::path::PathBuf;

use directories::BaseDirs;

const APP_DIR: &str = "ahkforge";

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/ahkforge` or falls back to `~/.config/ahkforge`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join(APP_DIR)
}

/// Default config file location.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the data directory.
///
/// Uses `$XDG_DATA_HOME/ahkforge` or falls back to `~/.local/share/ahkforge`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join(APP_DIR)
}

/// Interactive session history.
pub fn history_file() -> PathBuf {
    data_dir().join("history.txt")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir())
}
