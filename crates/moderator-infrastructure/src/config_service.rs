//! Configuration service implementation.
//!
//! Loads [`ModeratorConfig`] from `config.toml`
//! (~/.config/stream-moderator/config.toml unless a path is given).

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use moderator_core::config::ModeratorConfig;
use moderator_core::error::{ModeratorError, Result};

use crate::paths::ModeratorPaths;

/// Configuration service that loads and caches the moderator configuration.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// read is an `Io` error, one that does not parse is a `Serialization`
/// error, and one with out-of-range values is a `Config` error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ModeratorConfig>>>,
}

impl ConfigService {
    /// Creates a service reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading from the platform default location.
    pub fn from_default_location() -> Result<Self> {
        let path = ModeratorPaths::config_file()
            .map_err(|e| ModeratorError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ModeratorConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| ModeratorError::internal(format!("Config cache poisoned: {e}")))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = Self::load_config(&self.path)?;

        let mut write_lock = self
            .config
            .write()
            .map_err(|e| ModeratorError::internal(format!("Config cache poisoned: {e}")))?;
        *write_lock = Some(loaded.clone());

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(path: &Path) -> Result<ModeratorConfig> {
        if !path.exists() {
            tracing::info!(
                "[Config] No config file at {}, using defaults",
                path.display()
            );
            return Ok(ModeratorConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ModeratorConfig = toml::from_str(&content)?;
        config.validate()?;

        tracing::info!("[Config] Loaded configuration from {}", path.display());
        Ok(config)
    }
}
