//! Configuration service implementation.
//!
//! Loads `ProofingConfig` from `config.toml`, creating the file with defaults
//! when it is missing, and applies environment overrides for API keys.

use crate::dto::create_config_migrator;
use crate::paths::ProofingPaths;
use crate::storage::VersionedTomlFile;
use proofing_core::config::ProofingConfig;
use proofing_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub const STORAGE_API_KEY_ENV: &str = "PROOFING_STORAGE_API_KEY";
pub const EMAIL_API_KEY_ENV: &str = "PROOFING_EMAIL_API_KEY";

/// Configuration service that loads and caches the configuration.
///
/// The file is read lazily on first access and cached until
/// [`ConfigService::invalidate_cache`] is called.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<ProofingConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the config file under `paths`.
    pub fn new(paths: &ProofingPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A file that cannot be read or parsed is logged and replaced by
    /// defaults for this process; it is not overwritten.
    pub fn get_config(&self) -> ProofingConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|p| p.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to load config, using defaults: {}", e);
                ProofingConfig::default()
            }
        };
        let loaded = apply_env_overrides(loaded, |key| std::env::var(key).ok());

        {
            let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
        *write_lock = None;
    }

    /// Writes `config` and drops the cached copy.
    pub fn save_config(&self, config: &ProofingConfig) -> Result<()> {
        let migrator = create_config_migrator();
        VersionedTomlFile::new(self.path.clone(), "config", &migrator).save(config)?;
        self.invalidate_cache();
        Ok(())
    }

    fn load_config(&self) -> Result<ProofingConfig> {
        let migrator = create_config_migrator();
        let file = VersionedTomlFile::new(self.path.clone(), "config", &migrator);

        match file.load::<ProofingConfig>()? {
            Some(config) => Ok(config),
            None => {
                let default_config = ProofingConfig::default();
                file.save(&default_config)?;
                tracing::info!(path = %self.path.display(), "Created default config file");
                Ok(default_config)
            }
        }
    }
}

/// Replaces API keys with non-empty environment values.
fn apply_env_overrides(
    mut config: ProofingConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProofingConfig {
    if let Some(key) = lookup(STORAGE_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.storage.api_key = Some(key);
    }
    if let Some(key) = lookup(EMAIL_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.email.api_key = Some(key);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config();

        assert_eq!(config.autosave_interval_secs, 30);
        assert!(path.exists());
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config().outbox_max_attempts, 5);

        std::fs::write(&path, "version = \"1.0.0\"\noutbox_max_attempts = 2\n").unwrap();
        assert_eq!(service.get_config().outbox_max_attempts, 5);

        service.invalidate_cache();
        assert_eq!(service.get_config().outbox_max_attempts, 2);
    }

    #[test]
    fn test_save_config_is_visible_on_next_read() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        let mut config = service.get_config();
        config.access_token_length = 12;

        service.save_config(&config).unwrap();

        assert_eq!(service.get_config().access_token_length, 12);
    }

    #[test]
    fn test_env_overrides_replace_api_keys() {
        let config = apply_env_overrides(ProofingConfig::default(), |key| match key {
            STORAGE_API_KEY_ENV => Some("storage-secret".to_string()),
            EMAIL_API_KEY_ENV => Some("  ".to_string()),
            _ => None,
        });

        assert_eq!(config.storage.api_key.as_deref(), Some("storage-secret"));
        assert_eq!(config.email.api_key, None);
    }
}
