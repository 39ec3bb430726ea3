//! Configuration validation rules.
//!
//! Validation logic for `AgentConfig` values after they have been loaded
//! from environment, files, or defaults.

use crate::config::AgentConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AgentConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains whitespace
    /// - `origin` is not an http(s) URL with a host
    /// - `offline_url` or `api_prefix` is not an absolute path
    /// - a `precache` or `critical_assets` entry is empty
    /// - `static_extensions` is empty
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() || self.version.chars().any(char::is_whitespace) {
            return Err(invalid("version", "must be a non-empty tag without whitespace"));
        }

        self.origin_url()?;

        if !self.offline_url.starts_with('/') {
            return Err(invalid("offline_url", "must be an absolute path"));
        }
        if !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must be an absolute path"));
        }

        if self.precache.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("precache", "entries must not be empty"));
        }
        if self.critical_assets.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("critical_assets", "entries must not be empty"));
        }

        if self.static_extensions.is_empty() {
            return Err(invalid("static_extensions", "must list at least one extension"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.precache.contains(&self.offline_url) {
            tracing::warn!(
                offline_url = %self.offline_url,
                "offline_url is not in the precache manifest; navigations may fall back to a placeholder"
            );
        }

        Ok(())
    }
}
