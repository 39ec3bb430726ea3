//! cache_match tool implementation.
//!
//! Looks up a stored response by request, in one partition or across all.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheStore, Error, RequestKey};
use url::Url;

use crate::tools::{ResponseView, to_json};

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
    /// Search only this partition. Without it, partitions are searched in
    /// creation order.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub key: String,
    pub response: ResponseView,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(
    store: &dyn CacheStore, origin: &Url, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    let url = origin
        .join(params.url.trim())
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", params.url)))?;
    let key = RequestKey::new(&params.method, &url);

    let response = match &params.partition {
        Some(partition) => store.match_in(partition, &key).await?,
        None => store.lookup(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(key.url.clone()))?;

    let output = CacheMatchOutput { key: format!("{} {}", key.method, key.url), response: ResponseView::from(&response) };
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}
