//! Agent configuration with layered loading.
//!
//! Configuration is loaded with figment from, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Environment variables (SWCACHE_*)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Constant configuration of the cache agent.
///
/// Everything the agent knows besides the store contents lives here. Bumping
/// `version` yields fresh partition names, which is how stale caches are
/// detected at activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Version tag embedded in every partition name.
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional prefix for partition names (`{prefix}-{role}-{version}`).
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin of the application. Requests to other origins pass through.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Paths stored in the static partition at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Document served to navigations when both cache and network fail.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,

    /// Path prefix of API calls (network first).
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Critical runtime scripts served cache first without refresh.
    #[serde(default = "default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// File extensions treated as static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Path to the SQLite partition store. Unset keeps partitions in memory.
    ///
    /// Set via SWCACHE_DB_PATH environment variable.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds, enforced by the HTTP client.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_version() -> String {
    "v1".into()
}

fn default_cache_prefix() -> String {
    "pdf-tools".into()
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/manifest.json".into(), "/favicon.ico".into()]
}

fn default_offline_url() -> String {
    "/".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_critical_assets() -> Vec<String> {
    vec!["/pdf.worker.min.js".into()]
}

fn default_static_extensions() -> Vec<String> {
    ["js", "css", "png", "jpg", "jpeg", "svg", "gif", "webp", "woff", "woff2"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            precache: default_precache(),
            offline_url: default_offline_url(),
            api_prefix: default_api_prefix(),
            critical_assets: default_critical_assets(),
            static_extensions: default_static_extensions(),
            db_path: None,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AgentConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute
    /// http(s) URL with a host.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid { field: "origin".into(), reason: reason.into() };
        let url = Url::parse(&self.origin).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("must include a host"));
        }
        Ok(url)
    }

    /// Name of the partition for `role` under the current version.
    pub fn partition_name(&self, role: &str) -> String {
        if self.cache_prefix.is_empty() {
            format!("{role}-{}", self.version)
        } else {
            format!("{}-{role}-{}", self.cache_prefix, self.version)
        }
    }

    /// Current static (precache) partition.
    pub fn static_partition(&self) -> String {
        self.partition_name("static")
    }

    /// Current runtime partition.
    pub fn runtime_partition(&self) -> String {
        self.partition_name("runtime")
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
