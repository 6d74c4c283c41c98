//! ProofingConfig DTOs and migrations

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use proofing_core::config::{
    DEFAULT_ACCESS_TOKEN_LENGTH, DEFAULT_AUTOSAVE_INTERVAL_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_OUTBOX_MAX_ATTEMPTS, DEFAULT_OUTBOX_POLL_INTERVAL_SECS, EmailApiConfig, ProofingConfig,
    StorageApiConfig,
};

fn default_autosave_interval_secs() -> u64 {
    DEFAULT_AUTOSAVE_INTERVAL_SECS
}

fn default_outbox_poll_interval_secs() -> u64 {
    DEFAULT_OUTBOX_POLL_INTERVAL_SECS
}

fn default_outbox_max_attempts() -> u32 {
    DEFAULT_OUTBOX_MAX_ATTEMPTS
}

fn default_access_token_length() -> usize {
    DEFAULT_ACCESS_TOKEN_LENGTH
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageApiDTO {
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageApiDTO {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_key: None,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailApiDTO {
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub studio_address: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmailApiDTO {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_key: None,
            from_address: String::new(),
            studio_address: String::new(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Configuration file V1.0.0. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct ProofingConfigV1_0_0 {
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    #[serde(default = "default_outbox_poll_interval_secs")]
    pub outbox_poll_interval_secs: u64,
    #[serde(default = "default_outbox_max_attempts")]
    pub outbox_max_attempts: u32,
    #[serde(default = "default_access_token_length")]
    pub access_token_length: usize,
    #[serde(default)]
    pub storage: StorageApiDTO,
    #[serde(default)]
    pub email: EmailApiDTO,
}

impl IntoDomain<ProofingConfig> for ProofingConfigV1_0_0 {
    fn into_domain(self) -> ProofingConfig {
        ProofingConfig {
            autosave_interval_secs: self.autosave_interval_secs,
            outbox_poll_interval_secs: self.outbox_poll_interval_secs,
            outbox_max_attempts: self.outbox_max_attempts,
            access_token_length: self.access_token_length,
            storage: StorageApiConfig {
                api_base_url: self.storage.api_base_url,
                api_key: self.storage.api_key,
                timeout_secs: self.storage.timeout_secs,
            },
            email: EmailApiConfig {
                api_base_url: self.email.api_base_url,
                api_key: self.email.api_key,
                from_address: self.email.from_address,
                studio_address: self.email.studio_address,
                timeout_secs: self.email.timeout_secs,
            },
        }
    }
}

impl FromDomain<ProofingConfig> for ProofingConfigV1_0_0 {
    fn from_domain(config: ProofingConfig) -> Self {
        ProofingConfigV1_0_0 {
            autosave_interval_secs: config.autosave_interval_secs,
            outbox_poll_interval_secs: config.outbox_poll_interval_secs,
            outbox_max_attempts: config.outbox_max_attempts,
            access_token_length: config.access_token_length,
            storage: StorageApiDTO {
                api_base_url: config.storage.api_base_url,
                api_key: config.storage.api_key,
                timeout_secs: config.storage.timeout_secs,
            },
            email: EmailApiDTO {
                api_base_url: config.email.api_base_url,
                api_key: config.email.api_key,
                from_address: config.email.from_address,
                studio_address: config.email.studio_address,
                timeout_secs: config.email.timeout_secs,
            },
        }
    }
}

/// Creates and configures a Migrator instance for the configuration file.
pub fn create_config_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let config_path = version_migrate::Migrator::define("config")
        .from::<ProofingConfigV1_0_0>()
        .into_with_save::<ProofingConfig>();

    migrator
        .register(config_path)
        .expect("Failed to register config migration path");

    migrator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let migrator = create_config_migrator();
        let toml_str = r#"
version = "1.0.0"
autosave_interval_secs = 10

[email]
studio_address = "studio@example.com"
"#;
        let toml_value: toml::Value = toml::from_str(toml_str).unwrap();

        let config: ProofingConfig = migrator.load_flat_from("config", toml_value).unwrap();

        assert_eq!(config.autosave_interval_secs, 10);
        assert_eq!(config.outbox_max_attempts, DEFAULT_OUTBOX_MAX_ATTEMPTS);
        assert_eq!(config.access_token_length, DEFAULT_ACCESS_TOKEN_LENGTH);
        assert_eq!(config.email.studio_address, "studio@example.com");
        assert_eq!(config.email.timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert!(!config.storage.is_configured());
    }
}
