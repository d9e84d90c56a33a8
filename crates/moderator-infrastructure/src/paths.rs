//! Path management for moderator configuration files.
//!
//! ```text
//! ~/.config/stream-moderator/     # Config directory (platform default)
//! └── config.toml                 # Server, replay and classifier settings
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "stream-moderator";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct ModeratorPaths;

impl ModeratorPaths {
    /// Returns the moderator configuration directory
    /// (e.g. `~/.config/stream-moderator/` on Linux).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
