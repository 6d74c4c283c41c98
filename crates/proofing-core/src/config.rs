//! Runtime configuration of the proofing engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_OUTBOX_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_OUTBOX_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_ACCESS_TOKEN_LENGTH: usize = 8;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProofingConfig {
    pub autosave_interval_secs: u64,
    pub outbox_poll_interval_secs: u64,
    pub outbox_max_attempts: u32,
    pub access_token_length: usize,
    pub storage: StorageApiConfig,
    pub email: EmailApiConfig,
}

impl Default for ProofingConfig {
    fn default() -> Self {
        Self {
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            outbox_poll_interval_secs: DEFAULT_OUTBOX_POLL_INTERVAL_SECS,
            outbox_max_attempts: DEFAULT_OUTBOX_MAX_ATTEMPTS,
            access_token_length: DEFAULT_ACCESS_TOKEN_LENGTH,
            storage: StorageApiConfig::default(),
            email: EmailApiConfig::default(),
        }
    }
}

impl ProofingConfig {
    /// Auto-save period. Zero is treated as one second.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn outbox_poll_interval(&self) -> Duration {
        Duration::from_secs(self.outbox_poll_interval_secs.max(1))
    }
}

/// File-listing API access.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageApiConfig {
    /// Base URL of the listing API. Empty means "not configured".
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StorageApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_key: None,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl StorageApiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_base_url.trim().is_empty()
    }
}

/// Transactional email API access.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EmailApiConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub from_address: String,
    /// Where completion notices are sent.
    pub studio_address: String,
    pub timeout_secs: u64,
}

impl Default for EmailApiConfig {
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

impl EmailApiConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_base_url.trim().is_empty() && !self.studio_address.trim().is_empty()
    }
}
