//! sw_message tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{LocalHost, WorkerState};
use swcache_worker::{ControlMessage, ServiceAgent, ServiceWorker};

use super::lifecycle::{ActivateOutput, activate};
use super::to_json;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// SKIP_WAITING or CLEAR_CACHE.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwMessageOutput {
    #[serde(rename = "type")]
    pub kind: String,
    /// Partitions left after the message was applied.
    pub partitions: Vec<String>,
    /// Present when SKIP_WAITING released a waiting worker.
    pub activation: Option<ActivateOutput>,
    pub state: WorkerState,
}

/// Deliver a control message to the agent.
///
/// SKIP_WAITING on a worker that is installed and waiting activates it, as a
/// browser would.
pub async fn message_impl(
    agent: &ServiceAgent, host: &LocalHost, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let message = ControlMessage::from_type(params.kind.trim())?;
    agent.on_message(message).await;

    let activation = match message {
        ControlMessage::SkipWaiting if host.state() == WorkerState::Installed => Some(activate(agent, host).await?),
        _ => None,
    };

    let output = SwMessageOutput {
        kind: message.as_str().to_string(),
        partitions: agent.store().keys().await?,
        activation,
        state: host.state(),
    };
    Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
}
