//! Process-local partition store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::RequestKey;
use super::store::CacheStore;
use crate::Error;
use crate::http::Response;

struct Partition {
    name: String,
    entries: HashMap<RequestKey, Response>,
}

impl Partition {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), entries: HashMap::new() }
    }
}

/// In-memory cache store.
///
/// Partitions are kept in a `Vec` so enumeration follows creation order.
#[derive(Default)]
pub struct MemoryStore {
    partitions: RwLock<Vec<Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        if !partitions.iter().any(|p| p.name == name) {
            partitions.push(Partition::new(name));
        }
        Ok(())
    }

    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.entries.get(key))
            .cloned())
    }

    async fn put(&self, name: &str, key: &RequestKey, response: Response) -> Result<(), Error> {
        let mut partitions = self.partitions.write().await;
        let index = match partitions.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                partitions.push(Partition::new(name));
                partitions.len() - 1
            }
        };
        partitions[index].entries.insert(key.clone(), response);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != name);
        Ok(partitions.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let partitions = self.partitions.read().await;
        Ok(partitions.iter().map(|p| p.name.clone()).collect())
    }

    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        let partitions = self.partitions.read().await;
        let mut keys: Vec<RequestKey> = partitions
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(keys)
    }
}
