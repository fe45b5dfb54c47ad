//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` in the regimen config
//! directory, falling back to defaults when the file is missing.

use crate::paths::RegimenPaths;
use crate::storage::AtomicTomlFile;
use regimen_core::config::{EngineConfig, RootConfig};
use regimen_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Creates a service reading `config.toml` under `paths`.
    pub fn new(paths: &RegimenPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing file yields defaults. A malformed file is an error and is
    /// not cached, so a fixed file is picked up on the next call.
    pub fn get_config(&self) -> Result<RootConfig> {
        if let Ok(read_lock) = self.config.read() {
            if let Some(cached) = read_lock.as_ref() {
                return Ok(cached.clone());
            }
        }

        let loaded = AtomicTomlFile::<RootConfig>::new(self.path.clone())
            .load()?
            .unwrap_or_default();
        tracing::debug!("[Config] Loaded configuration from {:?}", self.path);

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }
        Ok(loaded)
    }

    /// Engine section of the configuration.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        Ok(self.get_config()?.engine)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }
}
