//! cache_keys tool implementation.
//!
//! Lists partitions in creation order with the URLs stored in each.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheStore, Error};

use crate::tools::to_json;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Only list this partition.
    #[serde(default)]
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PartitionListing {
    pub name: String,
    /// `METHOD url` per stored entry, sorted by URL.
    pub entries: Vec<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub partitions: Vec<PartitionListing>,
}

pub async fn keys_impl(store: &dyn CacheStore, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let names = store.keys().await?;
    let names: Vec<String> = match params.partition {
        Some(wanted) if names.contains(&wanted) => vec![wanted],
        Some(wanted) => return Err(Error::CacheMiss(format!("partition {wanted}")).into()),
        None => names,
    };

    let mut partitions = Vec::with_capacity(names.len());
    for name in names {
        let entries = store
            .entries(&name)
            .await?
            .into_iter()
            .map(|key| format!("{} {}", key.method, key.url))
            .collect();
        partitions.push(PartitionListing { name, entries });
    }

    let output = CacheKeysOutput { partitions };
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{key, output};
    use swcache_core::{MemoryStore, Response};

    #[tokio::test]
    async fn test_lists_partitions_in_creation_order() {
        let store = MemoryStore::new();
        store.put("static-v3", &key("/manifest.json"), Response::new("/manifest.json", 200, "{}")).await.unwrap();
        store.put("static-v3", &key("/"), Response::new("/", 200, "home")).await.unwrap();
        store.open("runtime-v3").await.unwrap();

        let out = output(&keys_impl(&store, CacheKeysParams::default()).await.unwrap());
        let partitions = out["partitions"].as_array().unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0]["name"], "static-v3");
        assert_eq!(
            partitions[0]["entries"],
            serde_json::json!(["GET https://pdf.example.com/", "GET https://pdf.example.com/manifest.json"])
        );
        assert_eq!(partitions[1]["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_filter_by_partition() {
        let store = MemoryStore::new();
        store.open("static-v3").await.unwrap();
        store.open("runtime-v3").await.unwrap();

        let params = CacheKeysParams { partition: Some("runtime-v3".into()) };
        let out = output(&keys_impl(&store, params).await.unwrap());
        assert_eq!(out["partitions"][0]["name"], "runtime-v3");

        let params = CacheKeysParams { partition: Some("static-v1".into()) };
        assert!(keys_impl(&store, params).await.is_err());
    }
}
