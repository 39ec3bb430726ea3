//! Scripted network for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;

use crate::fetch::Fetcher;
use swcache_core::{Error, Request, Response};

enum Scripted {
    Respond { status: u16, body: Bytes },
    Fail,
}

/// A `Fetcher` that answers from a script instead of the network.
///
/// Unscripted URLs fail like an unreachable host. `hold` makes every
/// subsequent fetch wait until the returned `Notify` is signalled.
#[derive(Default)]
pub struct MockFetcher {
    script: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and `body` from now on.
    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Respond { status, body: Bytes::copy_from_slice(body.as_bytes()) });
        self
    }

    /// Fail every fetch of `url` from now on.
    pub fn fail(&self, url: &str) -> &Self {
        self.script.lock().unwrap().insert(url.to_string(), Scripted::Fail);
        self
    }

    /// Block subsequent fetches until the returned gate is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Total number of fetches started.
    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of fetches started for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.script.lock().unwrap().get(&url) {
            Some(Scripted::Respond { status, body }) => Ok(Response::new(url.clone(), *status, body.clone())),
            Some(Scripted::Fail) | None => Err(Error::Network(format!("{url}: unreachable"))),
        }
    }
}
