//! Caching strategies.
//!
//! Each strategy takes the request, the target partition and a
//! `StrategyContext` holding the store and the network, and produces a
//! `Fetched`. Store failures never fail a request: reads degrade to misses
//! and writes are logged and dropped. Only 200 responses are written.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::fetch::Fetcher;
use swcache_core::{CacheStore, Error, Request, RequestKey, Response};

/// Where a handled response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Cache,
    Network,
    /// The designated offline document.
    Offline,
    /// Synthesized 503.
    Placeholder,
}

impl Served {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Offline => "offline",
            Self::Placeholder => "placeholder",
        }
    }
}

/// A response produced by a strategy, plus any detached work it started.
#[derive(Debug)]
pub struct Fetched {
    pub response: Response,
    pub served: Served,
    background: Option<JoinHandle<()>>,
}

impl Fetched {
    pub fn new(response: Response, served: Served) -> Self {
        Self { response, served, background: None }
    }

    fn with_background(mut self, task: JoinHandle<()>) -> Self {
        self.background = Some(task);
        self
    }

    /// Whether a detached write or refresh was started.
    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Wait for the detached work started while serving this response.
    ///
    /// Optional: dropping a `Fetched` leaves that work running.
    pub async fn wait_until(&mut self) {
        if let Some(task) = self.background.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "background cache task panicked");
        }
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Store and network handles shared by every strategy.
#[derive(Clone)]
pub struct StrategyContext {
    pub store: Arc<dyn CacheStore>,
    pub network: Arc<dyn Fetcher>,
}

impl StrategyContext {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>) -> Self {
        Self { store, network }
    }

    /// Lookup across all partitions; a store error counts as a miss.
    pub async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.store.lookup(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %key.url, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Write `response` if it is cacheable.
    ///
    /// Returns whether it was written. Callers that do not care about the
    /// outcome drop it; errors are already logged here.
    pub async fn store_if_ok(&self, partition: &str, key: &RequestKey, response: Response) -> bool {
        if !response.is_cacheable() {
            tracing::debug!(url = %key.url, status = response.status, "not caching non-200 response");
            return false;
        }
        match self.store.put(partition, key, response).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(partition, url = %key.url, error = %e, "cache write dropped");
                false
            }
        }
    }

    fn spawn_store(&self, partition: &str, key: RequestKey, response: Response) -> JoinHandle<()> {
        let ctx = self.clone();
        let partition = partition.to_string();
        tokio::spawn(async move {
            let _ = ctx.store_if_ok(&partition, &key, response).await;
        })
    }
}

/// Serve from cache; on a miss fetch, store and return the live response.
pub async fn cache_first(ctx: &StrategyContext, request: &Request, partition: &str) -> Result<Fetched, Error> {
    let key = request.key();
    if let Some(cached) = ctx.lookup(&key).await {
        tracing::debug!(url = %key.url, "cache hit");
        return Ok(Fetched::new(cached, Served::Cache));
    }

    fetch_and_store(ctx, request, &key, partition).await
}

async fn fetch_and_store(
    ctx: &StrategyContext, request: &Request, key: &RequestKey, partition: &str,
) -> Result<Fetched, Error> {
    tracing::debug!(url = %key.url, "cache miss");
    let response = ctx.network.fetch(request).await?;
    let _ = ctx.store_if_ok(partition, key, response.clone()).await;
    Ok(Fetched::new(response, Served::Network))
}

/// Like `cache_first`, but a hit also re-fetches in the background and
/// silently overwrites the entry when the refresh returns 200.
pub async fn cache_first_refresh(ctx: &StrategyContext, request: &Request, partition: &str) -> Result<Fetched, Error> {
    let key = request.key();
    let Some(cached) = ctx.lookup(&key).await else {
        return fetch_and_store(ctx, request, &key, partition).await;
    };

    tracing::debug!(url = %key.url, "cache hit, refreshing in background");
    let refresh = {
        let ctx = ctx.clone();
        let request = request.clone();
        let partition = partition.to_string();
        tokio::spawn(async move {
            match ctx.network.fetch(&request).await {
                Ok(response) => {
                    let _ = ctx.store_if_ok(&partition, &key, response).await;
                }
                Err(e) => tracing::debug!(url = %key.url, error = %e, "background refresh failed"),
            }
        })
    };

    Ok(Fetched::new(cached, Served::Cache).with_background(refresh))
}

/// Fetch first; record successes without blocking, fall back to the cache
/// when the network fails. A non-2xx status is a success here.
pub async fn network_first(ctx: &StrategyContext, request: &Request, partition: &str) -> Result<Fetched, Error> {
    let key = request.key();
    match ctx.network.fetch(request).await {
        Ok(response) => {
            let write = ctx.spawn_store(partition, key, response.clone());
            Ok(Fetched::new(response, Served::Network).with_background(write))
        }
        Err(err) => match ctx.lookup(&key).await {
            Some(cached) => {
                tracing::debug!(url = %key.url, error = %err, "network failed, serving cached copy");
                Ok(Fetched::new(cached, Served::Cache))
            }
            None => Err(err),
        },
    }
}

/// Serve the cached copy immediately while a network fetch refreshes it.
///
/// Without a cached copy the caller waits on the network; if that fails too
/// the fallbacks are, in order: an entry stored in the meantime, the offline
/// document, a synthesized 503. This strategy never returns an error.
pub async fn stale_while_revalidate(
    ctx: &StrategyContext, request: &Request, partition: &str, offline: &RequestKey,
) -> Fetched {
    let key = request.key();
    let cached = ctx.lookup(&key).await;

    let (tx, rx) = oneshot::channel();
    let revalidate = {
        let ctx = ctx.clone();
        let request = request.clone();
        let key = key.clone();
        let partition = partition.to_string();
        tokio::spawn(async move {
            match ctx.network.fetch(&request).await {
                Ok(response) => {
                    let _ = tx.send(Some(response.clone()));
                    let _ = ctx.store_if_ok(&partition, &key, response).await;
                }
                Err(e) => {
                    tracing::debug!(url = %key.url, error = %e, "revalidation failed");
                    let _ = tx.send(None);
                }
            }
        })
    };

    if let Some(cached) = cached {
        return Fetched::new(cached, Served::Cache).with_background(revalidate);
    }

    if let Ok(Some(response)) = rx.await {
        return Fetched::new(response, Served::Network).with_background(revalidate);
    }

    if let Some(cached) = ctx.lookup(&key).await {
        return Fetched::new(cached, Served::Cache);
    }
    if let Some(document) = ctx.lookup(offline).await {
        tracing::debug!(url = %key.url, offline = %offline.url, "serving offline document");
        return Fetched::new(document, Served::Offline);
    }

    tracing::debug!(url = %key.url, "no offline document, serving placeholder");
    Fetched::new(Response::offline_placeholder(key.url), Served::Placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use std::time::Duration;
    use swcache_core::MemoryStore;
    use url::Url;

    const ORIGIN: &str = "https://pdf.example.com";

    fn setup() -> (StrategyContext, Arc<MemoryStore>, Arc<MockFetcher>) {
        let store = Arc::new(MemoryStore::new());
        let network = Arc::new(MockFetcher::new());
        (StrategyContext::new(store.clone(), network.clone()), store, network)
    }

    fn url(path: &str) -> String {
        format!("{ORIGIN}{path}")
    }

    fn get(path: &str) -> Request {
        Request::get(Url::parse(&url(path)).unwrap())
    }

    async fn seed(store: &MemoryStore, partition: &str, path: &str, body: &str) {
        let request = get(path);
        store.put(partition, &request.key(), Response::new(url(path), 200, body.to_string())).await.unwrap();
    }

    async fn stored(store: &MemoryStore, partition: &str, path: &str) -> Option<Response> {
        store.match_in(partition, &get(path).key()).await.unwrap()
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/pdf.worker.min.js", "cached").await;

        let fetched = cache_first(&ctx, &get("/pdf.worker.min.js"), "runtime").await.unwrap();
        assert_eq!(fetched.served, Served::Cache);
        assert_eq!(fetched.response.body.as_ref(), b"cached");
        assert!(!fetched.has_background());
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_first_miss_stores() {
        let (ctx, store, network) = setup();
        network.respond(&url("/pdf.worker.min.js"), 200, "worker");

        let fetched = cache_first(&ctx, &get("/pdf.worker.min.js"), "runtime").await.unwrap();
        assert_eq!(fetched.served, Served::Network);
        assert_eq!(stored(&store, "runtime", "/pdf.worker.min.js").await.unwrap().body.as_ref(), b"worker");
    }

    #[tokio::test]
    async fn test_cache_first_miss_and_offline_propagates() {
        let (ctx, _store, _network) = setup();
        let result = cache_first(&ctx, &get("/pdf.worker.min.js"), "runtime").await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/api/status", "stale").await;
        network.fail(&url("/api/status"));

        let fetched = network_first(&ctx, &get("/api/status"), "runtime").await.unwrap();
        assert_eq!(fetched.served, Served::Cache);
        assert_eq!(fetched.response.body.as_ref(), b"stale");
    }

    #[tokio::test]
    async fn test_network_first_error_status_is_not_a_failure() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/api/status", "stale").await;
        network.respond(&url("/api/status"), 500, "boom");

        let mut fetched = network_first(&ctx, &get("/api/status"), "runtime").await.unwrap();
        fetched.wait_until().await;
        assert_eq!(fetched.served, Served::Network);
        assert_eq!(fetched.response.status, 500);
        assert_eq!(stored(&store, "runtime", "/api/status").await.unwrap().body.as_ref(), b"stale");
    }

    #[tokio::test]
    async fn test_refresh_failure_is_swallowed() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/app.css", "v1").await;
        network.fail(&url("/app.css"));

        let mut fetched = cache_first_refresh(&ctx, &get("/app.css"), "runtime").await.unwrap();
        fetched.wait_until().await;
        assert_eq!(fetched.response.body.as_ref(), b"v1");
        assert_eq!(network.calls_for(&url("/app.css")), 1);
        assert_eq!(stored(&store, "runtime", "/app.css").await.unwrap().body.as_ref(), b"v1");
    }

    #[tokio::test]
    async fn test_refresh_hit_does_not_wait_for_network() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/app.css", "v1").await;
        network.respond(&url("/app.css"), 200, "v2");
        let gate = network.hold();

        let request = get("/app.css");
        let pending = cache_first_refresh(&ctx, &request, "runtime");
        let mut fetched = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("cached copy returned while the refresh is pending")
            .unwrap();
        assert_eq!(fetched.served, Served::Cache);
        assert_eq!(fetched.response.body.as_ref(), b"v1");
        assert!(fetched.has_background());

        gate.notify_one();
        fetched.wait_until().await;
        assert_eq!(stored(&store, "runtime", "/app.css").await.unwrap().body.as_ref(), b"v2");
    }

    #[tokio::test]
    async fn test_refresh_ignores_non_200() {
        let (ctx, store, network) = setup();
        seed(&store, "runtime", "/app.css", "v1").await;
        network.respond(&url("/app.css"), 404, "gone");

        let mut fetched = cache_first_refresh(&ctx, &get("/app.css"), "runtime").await.unwrap();
        fetched.wait_until().await;
        assert_eq!(stored(&store, "runtime", "/app.css").await.unwrap().body.as_ref(), b"v1");
    }

    #[tokio::test]
    async fn test_swr_miss_waits_for_network() {
        let (ctx, store, network) = setup();
        network.respond(&url("/merge-pdf"), 200, "<html>merge</html>");
        let offline = get("/").key();

        let mut fetched = stale_while_revalidate(&ctx, &get("/merge-pdf"), "static", &offline).await;
        assert_eq!(fetched.served, Served::Network);
        fetched.wait_until().await;
        assert!(stored(&store, "static", "/merge-pdf").await.is_some());
    }

    #[tokio::test]
    async fn test_swr_hit_revalidates() {
        let (ctx, store, network) = setup();
        seed(&store, "static", "/", "old home").await;
        network.respond(&url("/"), 200, "new home");

        let mut fetched = stale_while_revalidate(&ctx, &get("/"), "static", &get("/").key()).await;
        assert_eq!(fetched.response.body.as_ref(), b"old home");
        fetched.wait_until().await;
        assert_eq!(stored(&store, "static", "/").await.unwrap().body.as_ref(), b"new home");
    }
}
