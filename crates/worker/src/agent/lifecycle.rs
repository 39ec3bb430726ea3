//! Install and activate handlers.
//!
//! Installation precaches the manifest best effort. Activation removes every
//! partition that does not belong to the current version.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::strategy::StrategyContext;
use swcache_core::{CacheStore, Error, Request};

/// Manifest fetches in flight at once.
const PRECACHE_CONCURRENCY: usize = 4;

/// A manifest entry that could not be precached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of precaching. Informational only: installation never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheReport {
    pub stored: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
}

impl PrecacheReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch every manifest URL with bounded concurrency and store each 200
/// response in `partition`. A failing entry does not affect the others.
///
/// The report lists entries in manifest order.
pub async fn precache(ctx: &StrategyContext, partition: &str, manifest: &[Url]) -> PrecacheReport {
    if let Err(e) = ctx.store.open(partition).await {
        tracing::warn!(partition, error = %e, "failed to open static partition");
    }

    let semaphore = Arc::new(Semaphore::new(PRECACHE_CONCURRENCY));
    let mut join_set = JoinSet::new();

    for (index, url) in manifest.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        let partition = partition.to_string();

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, precache_one(&ctx, &partition, &url).await)
        });
    }

    let mut outcomes: Vec<Option<Result<(), String>>> = vec![None; manifest.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => tracing::warn!(error = %e, "precache task failed"),
        }
    }

    let mut report = PrecacheReport::default();
    for (url, outcome) in manifest.iter().zip(outcomes) {
        match outcome.unwrap_or_else(|| Err("task aborted".to_string())) {
            Ok(()) => report.stored.push(url.to_string()),
            Err(reason) => {
                tracing::warn!(%url, %reason, "precache failed");
                report.failed.push(PrecacheFailure { url: url.to_string(), reason });
            }
        }
    }
    report
}

async fn precache_one(ctx: &StrategyContext, partition: &str, url: &Url) -> Result<(), String> {
    let request = Request::get(url.clone());
    let response = ctx.network.fetch(&request).await.map_err(|e| e.to_string())?;
    if !response.is_cacheable() {
        return Err(format!("status {}", response.status));
    }
    ctx.store
        .put(partition, &request.key(), response)
        .await
        .map_err(|e| e.to_string())
}

/// Delete every partition not named in `keep`, waiting for all deletions.
///
/// Returns the names that were deleted, in creation order. A failed delete
/// is logged and the rest still proceed.
pub async fn purge_partitions(store: &Arc<dyn CacheStore>, keep: &[String]) -> Result<Vec<String>, Error> {
    let stale: Vec<String> = store
        .keys()
        .await?
        .into_iter()
        .filter(|name| !keep.contains(name))
        .collect();

    let mut join_set = JoinSet::new();
    for (index, name) in stale.into_iter().enumerate() {
        let store = store.clone();
        join_set.spawn(async move {
            let result = store.delete(&name).await;
            (index, name, result)
        });
    }

    let mut deleted = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, name, Ok(_))) => {
                tracing::info!(partition = %name, "deleted partition");
                deleted.push((index, name));
            }
            Ok((_, name, Err(e))) => tracing::warn!(partition = %name, error = %e, "failed to delete partition"),
            Err(e) => tracing::warn!(error = %e, "partition delete task failed"),
        }
    }
    deleted.sort_by_key(|(index, _)| *index);
    Ok(deleted.into_iter().map(|(_, name)| name).collect())
}
