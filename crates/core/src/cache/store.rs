//! The cache store interface.

use async_trait::async_trait;

use super::hash::RequestKey;
use crate::Error;
use crate::http::Response;

/// Async key-value store of named partitions.
///
/// Implementations must be safe for concurrent use; callers never lock
/// around a read-then-write and accept last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open the named partition, creating it if absent.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Look up `key` in a single partition. A missing partition is a miss.
    async fn match_in(&self, name: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store `response` under `key`, creating the partition on first write.
    async fn put(&self, name: &str, key: &RequestKey, response: Response) -> Result<(), Error>;

    /// Delete a partition and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Partition names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Keys stored in a partition, sorted by URL.
    async fn entries(&self, name: &str) -> Result<Vec<RequestKey>, Error>;

    /// Search every partition in creation order and return the first match.
    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        for name in self.keys().await? {
            if let Some(response) = self.match_in(&name, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}

/// Behaviour every backend must share, run against each implementation.
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse(&format!("https://example.com{path}")).unwrap())
    }

    pub async fn put_then_match(store: &dyn CacheStore) {
        store.put("runtime-v1", &key("/a.css"), Response::new("https://example.com/a.css", 200, "a")).await.unwrap();

        let hit = store.match_in("runtime-v1", &key("/a.css")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"a");
        assert!(store.match_in("runtime-v1", &key("/b.css")).await.unwrap().is_none());
        assert!(store.match_in("missing", &key("/a.css")).await.unwrap().is_none());
    }

    pub async fn last_write_wins(store: &dyn CacheStore) {
        store.put("runtime-v1", &key("/a.js"), Response::new("/a.js", 200, "old")).await.unwrap();
        store.put("runtime-v1", &key("/a.js"), Response::new("/a.js", 200, "new")).await.unwrap();

        let hit = store.match_in("runtime-v1", &key("/a.js")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"new");
        assert_eq!(store.entries("runtime-v1").await.unwrap().len(), 1);
    }

    pub async fn keys_in_creation_order(store: &dyn CacheStore) {
        store.open("static-v1").await.unwrap();
        store.put("runtime-v1", &key("/x"), Response::new("/x", 200, "x")).await.unwrap();
        store.open("static-v1").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["static-v1".to_string(), "runtime-v1".to_string()]);
    }

    pub async fn delete_drops_entries(store: &dyn CacheStore) {
        store.put("runtime-v1", &key("/x"), Response::new("/x", 200, "x")).await.unwrap();

        assert!(store.delete("runtime-v1").await.unwrap());
        assert!(!store.delete("runtime-v1").await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
        assert!(store.match_in("runtime-v1", &key("/x")).await.unwrap().is_none());

        store.open("runtime-v1").await.unwrap();
        assert!(store.entries("runtime-v1").await.unwrap().is_empty());
    }

    pub async fn lookup_prefers_older_partition(store: &dyn CacheStore) {
        store.put("static-v1", &key("/"), Response::new("/", 200, "static")).await.unwrap();
        store.put("runtime-v1", &key("/"), Response::new("/", 200, "runtime")).await.unwrap();
        store.put("runtime-v1", &key("/only-runtime"), Response::new("/only-runtime", 200, "r")).await.unwrap();

        let hit = store.lookup(&key("/")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"static");
        assert!(store.lookup(&key("/only-runtime")).await.unwrap().is_some());
        assert!(store.lookup(&key("/nothing")).await.unwrap().is_none());
    }

    pub async fn preserves_headers_and_status(store: &dyn CacheStore) {
        let response = Response::new("https://example.com/font.woff2", 200, vec![0u8, 159, 146, 150])
            .with_header("Content-Type", "font/woff2");
        store.put("runtime-v1", &key("/font.woff2"), response.clone()).await.unwrap();

        let hit = store.match_in("runtime-v1", &key("/font.woff2")).await.unwrap().unwrap();
        assert_eq!(hit, response);
        assert_eq!(hit.content_type(), Some("font/woff2"));
    }

    pub async fn entries_sorted_by_url(store: &dyn CacheStore) {
        for path in ["/c", "/a", "/b"] {
            store.put("runtime-v1", &key(path), Response::new(path, 200, "")).await.unwrap();
        }
        let urls: Vec<_> = store.entries("runtime-v1").await.unwrap().into_iter().map(|k| k.url).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]);
    }
}
