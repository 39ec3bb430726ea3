//! Request classification.
//!
//! `classify` is a pure function of the request and the route table; it
//! decides whether the agent handles a request at all and, if so, which
//! strategy applies. First match wins.

use url::Url;

use crate::fetch::{is_extension_scheme, is_same_origin, path_extension};
use swcache_core::{AgentConfig, ConfigError, Request, RequestMode};

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    Method,
    ExtensionScheme,
    CrossOrigin,
}

impl Bypass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::ExtensionScheme => "extension_scheme",
            Self::CrossOrigin => "cross_origin",
        }
    }
}

/// Routing decision for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(Bypass),
    /// API call: network first.
    Api,
    /// Critical runtime script: cache first.
    CriticalAsset,
    /// Script/style/image/font: cache first, refreshed in the background.
    StaticAsset,
    /// Page load: stale-while-revalidate with offline fallback.
    Navigation,
    /// Anything else: network first.
    Default,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough(_) => "passthrough",
            Self::Api => "api",
            Self::CriticalAsset => "critical_asset",
            Self::StaticAsset => "static_asset",
            Self::Navigation => "navigation",
            Self::Default => "default",
        }
    }
}

/// The constant inputs to `classify`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub origin: Url,
    pub api_prefix: String,
    pub critical_assets: Vec<String>,
    pub static_extensions: Vec<String>,
}

impl RouteTable {
    pub fn from_config(config: &AgentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin_url()?,
            api_prefix: config.api_prefix.clone(),
            critical_assets: config
                .critical_assets
                .iter()
                .map(|asset| asset.trim())
                .filter(|asset| !asset.is_empty())
                .map(str::to_string)
                .collect(),
            static_extensions: config.static_extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
        })
    }

    /// Exact path or path suffix, so hashed build directories still match.
    fn is_critical(&self, path: &str) -> bool {
        self.critical_assets.iter().any(|asset| path.ends_with(asset.as_str()))
    }

    fn has_static_extension(&self, url: &Url) -> bool {
        path_extension(url).is_some_and(|ext| self.static_extensions.contains(&ext))
    }
}

pub fn classify(request: &Request, table: &RouteTable) -> Route {
    if !request.is_get() {
        return Route::Passthrough(Bypass::Method);
    }
    if is_extension_scheme(request.url.scheme()) {
        return Route::Passthrough(Bypass::ExtensionScheme);
    }
    if !is_same_origin(&request.url, &table.origin) {
        return Route::Passthrough(Bypass::CrossOrigin);
    }

    let path = request.url.path();

    if path.starts_with(&table.api_prefix) {
        Route::Api
    } else if table.is_critical(path) {
        Route::CriticalAsset
    } else if request.destination.is_static_asset() || table.has_static_extension(&request.url) {
        Route::StaticAsset
    } else if request.mode == RequestMode::Navigate || request.accepts_html() {
        Route::Navigation
    } else {
        Route::Default
    }
}
