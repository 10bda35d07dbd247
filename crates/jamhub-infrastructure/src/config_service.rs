//! Loading and saving `config.toml`.

use crate::paths::JamPaths;
use crate::storage::AtomicTomlFile;
use jamhub_core::Result;
use jamhub_core::config::JamConfig;
use std::path::{Path, PathBuf};

/// Reads [`JamConfig`] from disk. A missing file yields the defaults.
pub struct ConfigService {
    file: AtomicTomlFile<JamConfig>,
}

impl ConfigService {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicTomlFile::new(path.into()),
        }
    }

    /// Uses `~/.config/jamhub/config.toml`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::with_path(JamPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn load(&self) -> Result<JamConfig> {
        let config = self.file.load()?.unwrap_or_default();
        tracing::debug!(path = %self.path().display(), "Loaded config");
        Ok(config)
    }

    pub fn save(&self, config: &JamConfig) -> Result<()> {
        self.file.save(config)?;
        Ok(())
    }

    /// Data file from the config, falling back to `~/.local/share/jamhub/store.toml`.
    pub fn resolve_store_file(config: &JamConfig) -> Result<PathBuf> {
        match &config.store.data_file {
            Some(path) => Ok(path.clone()),
            None => Ok(JamPaths::store_file()?),
        }
    }
}
