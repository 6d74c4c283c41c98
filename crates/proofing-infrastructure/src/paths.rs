//! Unified path management for proofing files.
//!
//! All paths are resolved via AppPaths from the version-migrate crate so
//! configuration and data land in the platform's usual locations.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/proofing/          # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/
//!     └── proofing.log         # CLI log, appended
//!
//! ~/.local/share/proofing/     # Data directory
//! ├── sessions/                # One TOML file per selection session
//! └── outbox/                  # One TOML file per outbox event
//! ```

use proofing_core::error::{ProofingError, Result};
use std::path::PathBuf;
use version_migrate::AppPaths;

const APP_NAME: &str = "proofing";

/// Resolves proofing directories.
///
/// `with_base` pins everything under one directory, which the CLI exposes
/// as `--data-dir` and tests use with a temp dir.
#[derive(Debug, Clone, Default)]
pub struct ProofingPaths {
    base: Option<PathBuf>,
}

impl ProofingPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    fn app_paths() -> AppPaths {
        AppPaths::new(APP_NAME)
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.join("config"));
        }
        Self::app_paths()
            .config_dir()
            .map_err(|e| ProofingError::config(format!("Cannot resolve config directory: {}", e)))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.join("data"));
        }
        Self::app_paths()
            .data_dir()
            .map_err(|e| ProofingError::config(format!("Cannot resolve data directory: {}", e)))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("logs"))
    }

    pub fn sessions_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("sessions"))
    }

    pub fn outbox_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("outbox"))
    }
}
