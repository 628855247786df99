//! Configuration and log locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/booth-e2e/` and `~/.local/share/booth-e2e/logs/`
//! - macOS: `~/Library/Application Support/booth-e2e/`
//! - Windows: `%APPDATA%\booth-e2e\`

use std::io;
use std::path::PathBuf;

/// Application name used for all project directories
const APP_NAME: &str = "booth-e2e";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Ensure the log directory exists
pub fn ensure_log_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = log_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}

/// Human-readable hint of where configuration is read from
pub fn config_hint() -> String {
    config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "config.toml".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_toml() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_config_hint_is_never_empty() {
        assert!(!config_hint().is_empty());
    }
}
