//! The cache agent.
//!
//! `ServiceAgent` receives the four worker events (install, activate, fetch,
//! message) and holds nothing but constant configuration. Partition contents
//! live in the injected `CacheStore`, the network behind a `Fetcher`, and
//! lifecycle control behind the host's `WorkerHost`.
//!
//! ```text
//! fetch event → classify → strategy → store and/or network → Fetched
//! ```

pub mod control;
pub mod lifecycle;
pub mod router;
pub mod strategy;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

pub use control::ControlMessage;
pub use lifecycle::{PrecacheFailure, PrecacheReport};
pub use router::{Bypass, Route, RouteTable, classify};
pub use strategy::{Fetched, Served, StrategyContext};

use crate::fetch::{Fetcher, resolve};
use swcache_core::{AgentConfig, CacheStore, Error, Request, RequestKey, WorkerHost};

/// One method per worker event.
#[async_trait]
pub trait ServiceWorker: Send + Sync {
    /// Precache the manifest and ask to skip waiting. Never fails.
    async fn on_install(&self) -> PrecacheReport;

    /// Drop partitions of other versions, then claim clients.
    async fn on_activate(&self) -> Result<Vec<String>, Error>;

    /// Handle an intercepted request. `Ok(None)` means the request is not
    /// ours and goes to the network untouched.
    async fn on_fetch(&self, request: &Request) -> Result<Option<Fetched>, Error>;

    /// Apply a control message. Fire and forget: failures are only logged.
    async fn on_message(&self, message: ControlMessage);
}

/// Cache agent built from constant configuration.
pub struct ServiceAgent {
    static_partition: String,
    runtime_partition: String,
    manifest: Vec<Url>,
    offline: RequestKey,
    routes: RouteTable,
    ctx: StrategyContext,
    host: Arc<dyn WorkerHost>,
}

impl ServiceAgent {
    /// Build an agent, resolving the manifest and offline document against
    /// the configured origin.
    pub fn new(
        config: &AgentConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Fetcher>, host: Arc<dyn WorkerHost>,
    ) -> Result<Self, Error> {
        let routes = RouteTable::from_config(config).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let resolve_path = |path: &str| resolve(&routes.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()));

        let manifest = config
            .precache
            .iter()
            .map(|path| resolve_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        let offline = RequestKey::get(&resolve_path(&config.offline_url)?);

        Ok(Self {
            static_partition: config.static_partition(),
            runtime_partition: config.runtime_partition(),
            manifest,
            offline,
            routes,
            ctx: StrategyContext::new(store, network),
            host,
        })
    }

    pub fn origin(&self) -> &Url {
        &self.routes.origin
    }

    pub fn static_partition(&self) -> &str {
        &self.static_partition
    }

    pub fn runtime_partition(&self) -> &str {
        &self.runtime_partition
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.ctx.store
    }

    pub fn route(&self, request: &Request) -> Route {
        classify(request, &self.routes)
    }
}

#[async_trait]
impl ServiceWorker for ServiceAgent {
    async fn on_install(&self) -> PrecacheReport {
        let report = lifecycle::precache(&self.ctx, &self.static_partition, &self.manifest).await;
        tracing::info!(
            partition = %self.static_partition,
            stored = report.stored.len(),
            failed = report.failed.len(),
            "installed"
        );
        self.host.skip_waiting();
        report
    }

    async fn on_activate(&self) -> Result<Vec<String>, Error> {
        let keep = [self.static_partition.clone(), self.runtime_partition.clone()];
        let purged = lifecycle::purge_partitions(&self.ctx.store, &keep).await;
        self.host.claim_clients();
        let deleted = purged?;
        tracing::info!(deleted = deleted.len(), "activated");
        Ok(deleted)
    }

    async fn on_fetch(&self, request: &Request) -> Result<Option<Fetched>, Error> {
        let route = self.route(request);
        tracing::debug!(url = %request.url, ?route, "intercepted request");

        let fetched = match route {
            Route::Passthrough(_) => return Ok(None),
            Route::Api | Route::Default => {
                strategy::network_first(&self.ctx, request, &self.runtime_partition).await?
            }
            Route::CriticalAsset => strategy::cache_first(&self.ctx, request, &self.runtime_partition).await?,
            Route::StaticAsset => strategy::cache_first_refresh(&self.ctx, request, &self.runtime_partition).await?,
            Route::Navigation => {
                strategy::stale_while_revalidate(&self.ctx, request, &self.static_partition, &self.offline).await
            }
        };
        Ok(Some(fetched))
    }

    async fn on_message(&self, message: ControlMessage) {
        tracing::info!(message = message.as_str(), "control message");
        match message {
            ControlMessage::SkipWaiting => self.host.skip_waiting(),
            ControlMessage::ClearCache => {
                if let Err(e) = lifecycle::purge_partitions(&self.ctx.store, &[]).await {
                    tracing::warn!(error = %e, "failed to clear partitions");
                }
            }
        }
    }
}
