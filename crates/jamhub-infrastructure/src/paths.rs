//! Unified path management for JamHub files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/jamhub/            # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/jamhub/       # Data directory
//! └── store.toml               # Document store (TomlFileStore)
//! ```

use std::path::PathBuf;
use thiserror::Error;

const APP_NAME: &str = "jamhub";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform base directory could not be determined.
    #[error("Cannot determine the {0} directory")]
    BaseDirNotFound(&'static str),
}

impl From<PathError> for jamhub_core::JamError {
    fn from(err: PathError) -> Self {
        jamhub_core::JamError::config(err.to_string())
    }
}

/// Platform paths for JamHub, resolved through the `dirs` crate.
pub struct JamPaths;

impl JamPaths {
    /// Returns the config directory (e.g., `~/.config/jamhub/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::BaseDirNotFound("config"))
    }

    /// Returns the data directory (e.g., `~/.local/share/jamhub/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or(PathError::BaseDirNotFound("data"))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn store_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store.toml"))
    }
}
