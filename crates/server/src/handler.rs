//! MCP server handler implementation.
//!
//! The handler plays the host runtime for one agent: it owns the lifecycle
//! state and routes tool calls to the tool implementations.

use std::sync::Arc;

use crate::tools::cache::{CacheKeysParams, CacheMatchParams, keys_impl, match_impl};
use crate::tools::{SwFetchParams, SwMessageParams, activate_impl, fetch_impl, install_impl, message_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_core::LocalHost;
use swcache_worker::{Fetcher, ServiceAgent};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    agent: Arc<ServiceAgent>,
    host: Arc<LocalHost>,
    network: Arc<dyn Fetcher>,
}

#[tool_router]
impl SwCacheServer {
    pub fn new(agent: Arc<ServiceAgent>, host: Arc<LocalHost>, network: Arc<dyn Fetcher>) -> Self {
        Self { tool_router: Self::tool_router(), agent, host, network }
    }

    #[tool(
        description = "Install the worker: precache the manifest into the static partition (best effort) and request skip-waiting. Activates immediately when skip-waiting was requested."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.agent, &self.host).await
    }

    #[tool(description = "Activate the worker: delete partitions of other versions, then claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.agent, &self.host).await
    }

    /// Deliver a fetch event.
    ///
    /// Classifies the request, runs the matching strategy, and waits for any
    /// cache write it started before returning.
    #[tool(
        description = "Route a request through the worker. Returns the route, where the response came from (cache, network, offline, placeholder, passthrough), and the response."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, self.network.as_ref(), params.0).await
    }

    #[tool(description = "Send a control message to the worker: SKIP_WAITING or CLEAR_CACHE.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.agent, &self.host, params.0).await
    }

    #[tool(description = "List cache partitions in creation order with the request keys stored in each.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(self.agent.store().as_ref(), params.0).await
    }

    #[tool(description = "Look up a stored response by URL, in one partition or across all partitions.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(self.agent.store().as_ref(), self.agent.origin(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Cache agent for an offline-capable web app. Call sw_install first, then sw_fetch to route requests."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
