//! Request keys and their content-addressed digests.

use sha2::{Digest, Sha256};
use url::Url;

/// Identity of a stored entry: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// Stable digest used as the durable row key.
    pub fn digest(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// Compute a content-addressed cache key for a request.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
