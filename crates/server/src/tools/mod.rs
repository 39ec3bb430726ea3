//! MCP tool implementations.
//!
//! The server plays the host runtime: lifecycle and fetch tools deliver
//! events to the agent, cache tools inspect the partition store.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Error, Response};

pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};
pub use message::{SwMessageParams, message_impl};

/// Bodies longer than this are cut in tool output.
const BODY_PREVIEW_BYTES: usize = 64 * 1024;

/// A response as shown to MCP clients.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    /// Body as UTF-8 (lossy), at most 64KiB.
    pub body: String,
    pub body_bytes: usize,
    pub truncated: bool,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        let shown = &response.body[..response.body.len().min(BODY_PREVIEW_BYTES)];
        Self {
            url: response.url.clone(),
            status: response.status,
            content_type: response.content_type().map(str::to_string),
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(shown).into_owned(),
            body_bytes: response.body.len(),
            truncated: shown.len() < response.body.len(),
        }
    }
}

pub(crate) fn to_json<T: Serialize>(output: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(output).map_err(|e| Error::Serialization(format!("Failed to serialize output: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use rmcp::model::CallToolResult;
    use swcache_core::{AgentConfig, LocalHost, MemoryStore, RequestKey};
    use swcache_worker::ServiceAgent;
    use swcache_worker::testing::MockFetcher;

    pub const ORIGIN: &str = "https://pdf.example.com";

    pub struct Fixture {
        pub agent: ServiceAgent,
        pub store: Arc<MemoryStore>,
        pub network: Arc<MockFetcher>,
        pub host: Arc<LocalHost>,
    }

    pub fn fixture() -> Fixture {
        let config = AgentConfig {
            origin: ORIGIN.into(),
            version: "v3".into(),
            cache_prefix: String::new(),
            precache: vec!["/".into(), "/manifest.json".into()],
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(MockFetcher::new());
        let host = Arc::new(LocalHost::new());
        let agent = ServiceAgent::new(&config, store.clone(), network.clone(), host.clone()).unwrap();
        Fixture { agent, store, network, host }
    }

    pub fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    pub fn key(path: &str) -> RequestKey {
        RequestKey::get(&::url::Url::parse(&url(path)).unwrap())
    }

    /// Parse the JSON text content of a tool result.
    pub fn output(result: &CallToolResult) -> serde_json::Value {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
