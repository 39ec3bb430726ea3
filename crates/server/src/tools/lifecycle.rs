//! sw_install and sw_activate tool implementations.
//!
//! The server is the host runtime here: it moves the worker through its
//! lifecycle stages and delivers the install and activate events.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{LocalHost, WorkerState};
use swcache_worker::{PrecacheReport, ServiceAgent, ServiceWorker};

use super::to_json;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InstallOutput {
    pub partition: String,
    pub stored: Vec<String>,
    pub failed: Vec<FailedEntry>,
    pub skip_waiting: bool,
    /// Present when the worker activated straight after installing.
    pub activation: Option<ActivateOutput>,
    pub state: WorkerState,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedEntry {
    pub url: String,
    pub reason: String,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActivateOutput {
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
    pub state: WorkerState,
}

/// Run the install event. If the agent asked to skip waiting, the worker is
/// activated right away.
pub async fn install_impl(agent: &ServiceAgent, host: &LocalHost) -> Result<CallToolResult, McpError> {
    let output = install(agent, host).await?;
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}

pub async fn activate_impl(agent: &ServiceAgent, host: &LocalHost) -> Result<CallToolResult, McpError> {
    let output = activate(agent, host).await?;
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}

async fn install(agent: &ServiceAgent, host: &LocalHost) -> Result<InstallOutput, McpError> {
    host.set_state(WorkerState::Installing);
    let PrecacheReport { stored, failed } = agent.on_install().await;
    host.set_state(WorkerState::Installed);

    let skip_waiting = host.skip_waiting_requested();
    let activation = if skip_waiting { Some(activate(agent, host).await?) } else { None };

    Ok(InstallOutput {
        partition: agent.static_partition().to_string(),
        stored,
        failed: failed
            .into_iter()
            .map(|f| FailedEntry { url: f.url, reason: f.reason })
            .collect(),
        skip_waiting,
        activation,
        state: host.state(),
    })
}

pub(crate) async fn activate(agent: &ServiceAgent, host: &LocalHost) -> Result<ActivateOutput, McpError> {
    host.set_state(WorkerState::Activating);
    let deleted = agent.on_activate().await;
    host.set_state(WorkerState::Activated);
    Ok(ActivateOutput { deleted: deleted?, clients_claimed: host.clients_claimed(), state: host.state() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{fixture, key, output, url};
    use swcache_core::{CacheStore, Response};

    #[tokio::test]
    async fn test_install_activates_after_skip_waiting() {
        let fx = fixture();
        fx.network.respond(&url("/"), 200, "home").respond(&url("/manifest.json"), 200, "{}");
        fx.store.put("static-v2", &key("/"), Response::new("/", 200, "old")).await.unwrap();

        let result = install_impl(&fx.agent, &fx.host).await.unwrap();
        let out = output(&result);

        assert_eq!(out["partition"], "static-v3");
        assert_eq!(out["stored"].as_array().unwrap().len(), 2);
        assert_eq!(out["skip_waiting"], true);
        assert_eq!(out["state"], "activated");
        assert_eq!(out["activation"]["deleted"], serde_json::json!(["static-v2"]));
        assert_eq!(out["activation"]["clients_claimed"], true);
        assert_eq!(fx.store.keys().await.unwrap(), vec!["static-v3".to_string()]);
    }

    #[tokio::test]
    async fn test_install_reports_failures() {
        let fx = fixture();
        fx.network.respond(&url("/"), 200, "home").respond(&url("/manifest.json"), 500, "boom");

        let out = output(&install_impl(&fx.agent, &fx.host).await.unwrap());
        assert_eq!(out["failed"][0]["url"], url("/manifest.json"));
        assert_eq!(out["failed"][0]["reason"], "status 500");
        assert_eq!(out["state"], "activated");
    }

    #[tokio::test]
    async fn test_activate_alone() {
        let fx = fixture();
        fx.store.open("runtime-v1").await.unwrap();
        fx.store.open("runtime-v3").await.unwrap();

        let out = output(&activate_impl(&fx.agent, &fx.host).await.unwrap());
        assert_eq!(out["deleted"], serde_json::json!(["runtime-v1"]));
        assert_eq!(out["clients_claimed"], true);
        assert_eq!(fx.host.state(), WorkerState::Activated);
    }
}
