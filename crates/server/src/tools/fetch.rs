//! sw_fetch tool implementation.
//!
//! Delivers a fetch event to the agent. Requests the agent declines are sent
//! to the network as the host would, without touching any partition. The
//! reply never waits for a background refresh or cache write.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{Destination, Error, Request, RequestMode, Response};
use swcache_worker::fetch::resolve;
use swcache_worker::{Fetched, Fetcher, Route, ServiceAgent, ServiceWorker};

use super::{ResponseView, to_json};

fn default_method() -> String {
    "GET".to_string()
}

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,
    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
    /// Request destination (document, script, style, image, font, ...).
    #[serde(default)]
    pub destination: Option<Destination>,
    /// Request mode (navigate, same-origin, no-cors, cors).
    #[serde(default)]
    pub mode: Option<RequestMode>,
    /// Accept header value.
    #[serde(default)]
    pub accept: Option<String>,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub route: String,
    /// cache, network, offline, placeholder or passthrough.
    pub served: String,
    pub response: ResponseView,
}

pub async fn fetch_impl(
    agent: &ServiceAgent, network: &dyn Fetcher, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    let request = build_request(agent, params)?;
    let route = agent.route(&request);

    let (served, response) = match agent.on_fetch(&request).await? {
        Some(fetched) => (fetched.served.as_str(), detach(fetched)),
        None => ("passthrough", network.fetch(&request).await?),
    };

    tracing::info!(url = %request.url, route = route.as_str(), served, status = response.status, "fetch handled");

    let output = SwFetchOutput {
        route: route_name(route),
        served: served.to_string(),
        response: ResponseView::from(&response),
    };
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}

/// Take the response and leave any refresh or cache write running on its own.
fn detach(mut fetched: Fetched) -> Response {
    let response = fetched.response.clone();
    if fetched.has_background() {
        tokio::spawn(async move { fetched.wait_until().await });
    }
    response
}

fn build_request(agent: &ServiceAgent, params: SwFetchParams) -> Result<Request, Error> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method must not be empty".into()));
    }
    let url = resolve(agent.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::get(url).with_method(params.method.trim().to_ascii_uppercase());
    if let Some(destination) = params.destination {
        request = request.with_destination(destination);
    }
    if let Some(mode) = params.mode {
        request = request.with_mode(mode);
    }
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }
    Ok(request)
}

fn route_name(route: Route) -> String {
    match route {
        Route::Passthrough(reason) => format!("passthrough:{}", reason.as_str()),
        other => other.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fixture, key, output, url};
    use std::time::Duration;
    use swcache_core::CacheStore;

    fn params(path: &str) -> SwFetchParams {
        SwFetchParams { url: path.into(), method: default_method(), destination: None, mode: None, accept: None }
    }

    #[tokio::test]
    async fn test_static_asset_served_from_network_then_cache() {
        let fx = fixture();
        fx.network.respond(&url("/app.css"), 200, "body{}");

        let first = output(&fetch_impl(&fx.agent, fx.network.as_ref(), params("/app.css")).await.unwrap());
        assert_eq!(first["route"], "static_asset");
        assert_eq!(first["served"], "network");

        let second = output(&fetch_impl(&fx.agent, fx.network.as_ref(), params("/app.css")).await.unwrap());
        assert_eq!(second["served"], "cache");
        assert_eq!(second["response"]["body"], "body{}");
    }

    #[tokio::test]
    async fn test_cached_navigation_replies_while_network_hangs() {
        let fx = fixture();
        fx.store.put("static-v3", &key("/merge-pdf"), Response::new(url("/merge-pdf"), 200, "stale")).await.unwrap();
        fx.network.respond(&url("/merge-pdf"), 200, "fresh");
        let gate = fx.network.hold();

        let mut p = params("/merge-pdf");
        p.mode = Some(RequestMode::Navigate);
        let result = tokio::time::timeout(Duration::from_secs(1), fetch_impl(&fx.agent, fx.network.as_ref(), p))
            .await
            .expect("cached page returned before the network answered")
            .unwrap();

        let out = output(&result);
        assert_eq!(out["served"], "cache");
        assert_eq!(out["response"]["body"], "stale");

        gate.notify_one();
        for _ in 0..100 {
            let stored = fx.store.match_in("static-v3", &key("/merge-pdf")).await.unwrap().unwrap();
            if stored.body.as_ref() == b"fresh" {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("revalidation never updated the cached page");
    }

    #[tokio::test]
    async fn test_cached_static_asset_replies_while_network_hangs() {
        let fx = fixture();
        fx.store.put("runtime-v3", &key("/app.css"), Response::new(url("/app.css"), 200, "old")).await.unwrap();
        fx.network.respond(&url("/app.css"), 200, "new");
        let _gate = fx.network.hold();

        let pending = fetch_impl(&fx.agent, fx.network.as_ref(), params("/app.css"));
        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("cached asset returned before the refresh finished")
            .unwrap();

        let out = output(&result);
        assert_eq!(out["route"], "static_asset");
        assert_eq!(out["served"], "cache");
        assert_eq!(out["response"]["body"], "old");
    }

    #[tokio::test]
    async fn test_post_passes_through() {
        let fx = fixture();
        fx.network.respond(&url("/api/compress"), 201, "queued");

        let mut p = params("/api/compress");
        p.method = "post".into();
        let out = output(&fetch_impl(&fx.agent, fx.network.as_ref(), p).await.unwrap());

        assert_eq!(out["route"], "passthrough:method");
        assert_eq!(out["served"], "passthrough");
        assert_eq!(out["response"]["status"], 201);
        assert!(fx.store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_offline_gets_offline_document() {
        let fx = fixture();
        fx.store.put("static-v3", &key("/"), Response::new(url("/"), 200, "<html>home</html>")).await.unwrap();

        let mut p = params("/merge-pdf");
        p.mode = Some(RequestMode::Navigate);
        let out = output(&fetch_impl(&fx.agent, fx.network.as_ref(), p).await.unwrap());

        assert_eq!(out["route"], "navigation");
        assert_eq!(out["served"], "offline");
        assert_eq!(out["response"]["body"], "<html>home</html>");
    }

    #[tokio::test]
    async fn test_api_offline_without_cache_is_an_error() {
        let fx = fixture();
        let result = fetch_impl(&fx.agent, fx.network.as_ref(), params("/api/jobs")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let fx = fixture();
        assert!(fetch_impl(&fx.agent, fx.network.as_ref(), params("ftp://pdf.example.com/x")).await.is_err());

        let mut p = params("/");
        p.method = "  ".into();
        assert!(fetch_impl(&fx.agent, fx.network.as_ref(), p).await.is_err());
    }
}
