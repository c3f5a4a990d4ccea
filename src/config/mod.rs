//! # Configuration Management
//!
//! Connection settings for the Vault KV v2 backend, loaded from the
//! environment and validated with `validator`.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::{Error, Result};
use crate::types::SecretString;

/// Default KV v2 mount name
pub const DEFAULT_MOUNT_NAME: &str = "secret";

/// Default Vault address for local development
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8200";

fn default_enabled() -> bool {
    true
}

fn default_mount_name() -> String {
    DEFAULT_MOUNT_NAME.to_string()
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Vault client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VaultClientConfig {
    /// Whether the backend is used at all; a disabled client answers every
    /// operation with a "service not available" result
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Vault server address (e.g., "https://vault.example.com:8200")
    #[serde(default = "default_address")]
    #[validate(length(min = 1, message = "Vault address cannot be empty"))]
    pub address: String,

    /// Vault authentication token
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Vault namespace (Enterprise multi-tenancy)
    #[serde(default)]
    pub namespace: Option<String>,

    /// KV v2 mount name (default: "secret")
    #[serde(default = "default_mount_name")]
    #[validate(custom(function = "validate_mount_name"))]
    pub mount_name: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for VaultClientConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            address: default_address(),
            token: None,
            namespace: None,
            mount_name: default_mount_name(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// The mount name is a single path segment.
pub fn validate_mount_name(mount_name: &str) -> std::result::Result<(), ValidationError> {
    if mount_name.is_empty() || mount_name.contains('/') || mount_name.trim() != mount_name {
        let mut error = ValidationError::new("invalid_mount_name");
        error.message = Some("Mount name must be a single non-empty path segment".into());
        return Err(error);
    }
    Ok(())
}

fn env_var(primary: &str, fallback: Option<&str>) -> Option<String> {
    std::env::var(primary)
        .ok()
        .or_else(|| fallback.and_then(|name| std::env::var(name).ok()))
        .filter(|value| !value.is_empty())
}

impl VaultClientConfig {
    /// Load configuration from environment variables.
    ///
    /// - `KVTREE_VAULT_ENABLED` (default: true)
    /// - `KVTREE_VAULT_ADDR` or `VAULT_ADDR`
    /// - `KVTREE_VAULT_TOKEN` or `VAULT_TOKEN`
    /// - `KVTREE_VAULT_NAMESPACE` or `VAULT_NAMESPACE`
    /// - `KVTREE_VAULT_MOUNT` (default: "secret")
    /// - `KVTREE_VAULT_TIMEOUT_SECONDS` (default: 30)
    pub fn from_env() -> Result<Self> {
        let enabled = match env_var("KVTREE_VAULT_ENABLED", None) {
            Some(value) => value.parse::<bool>().map_err(|e| {
                Error::config(format!("Invalid KVTREE_VAULT_ENABLED '{}': {}", value, e))
            })?,
            None => default_enabled(),
        };

        let timeout_seconds = match env_var("KVTREE_VAULT_TIMEOUT_SECONDS", None) {
            Some(value) => value.parse::<u64>().map_err(|e| {
                Error::config(format!("Invalid KVTREE_VAULT_TIMEOUT_SECONDS '{}': {}", value, e))
            })?,
            None => default_timeout_seconds(),
        };

        let config = Self {
            enabled,
            address: env_var("KVTREE_VAULT_ADDR", Some("VAULT_ADDR"))
                .unwrap_or_else(default_address),
            token: env_var("KVTREE_VAULT_TOKEN", Some("VAULT_TOKEN")).map(SecretString::from),
            namespace: env_var("KVTREE_VAULT_NAMESPACE", Some("VAULT_NAMESPACE")),
            mount_name: env_var("KVTREE_VAULT_MOUNT", None).unwrap_or_else(default_mount_name),
            timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if self.enabled && url::Url::parse(&self.address).is_err() {
            return Err(Error::validation_field(
                format!("Vault address '{}' is not a valid URL", self.address),
                "address",
            ));
        }
        Ok(())
    }

    /// Builder-style mount override
    pub fn with_mount_name(mut self, mount_name: impl Into<String>) -> Self {
        self.mount_name = mount_name.into();
        self
    }

    /// Builder-style address override
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}
