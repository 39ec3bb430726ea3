//! swcache server entry point.
//!
//! Boots the cache agent behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_core::{AgentConfig, CacheDb, CacheStore, LocalHost, MemoryStore};
use swcache_worker::{FetchConfig, Fetcher, HttpFetcher, ServiceAgent};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AgentConfig::load().context("failed to load configuration")?;

    let store: Arc<dyn CacheStore> = match &config.db_path {
        Some(path) => Arc::new(
            CacheDb::open(path)
                .await
                .with_context(|| format!("failed to open cache database at {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };
    let network: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let host = Arc::new(LocalHost::new());
    let agent = ServiceAgent::new(&config, store, network.clone(), host.clone())?;

    tracing::info!(
        version = %config.version,
        origin = %agent.origin(),
        static_partition = agent.static_partition(),
        runtime_partition = agent.runtime_partition(),
        persistent = config.db_path.is_some(),
        "Starting swcache server on stdio transport"
    );

    let handler = handler::SwCacheServer::new(Arc::new(agent), host, network);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
