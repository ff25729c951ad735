use anyhow::Result;
use rmcp::{
    ErrorData as McpError, RoleClient, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{Peer, RequestContext},
    transport::stdio,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::lister::{ToolLister, ToolRoute};
use crate::upstream::upstream_error;

/// MCP server that provides stdio transport with strict tool schemas
///
/// `tools/list` is answered by the registered [`ToolRoute`]; `tools/call` is
/// forwarded to the upstream server when there is one.
pub struct StrictProxyServer<L> {
    /// Listing capability registered for this server
    route: ToolRoute<L>,

    /// Upstream peer for tool calls (None when serving a static catalog)
    upstream: Option<Peer<RoleClient>>,
}

impl<L: ToolLister> StrictProxyServer<L> {
    pub fn new(route: ToolRoute<L>, upstream: Option<Peer<RoleClient>>) -> Self {
        Self { route, upstream }
    }

    /// Serve over stdio until the client disconnects or `shutdown_token` fires
    pub async fn serve_stdio(self, shutdown_token: CancellationToken) -> Result<()> {
        log::info!(
            "Starting stdio server ({} tool listing)",
            if self.route.is_strict() { "strict" } else { "unpatched" }
        );

        let service = self.serve(stdio()).await.inspect_err(|e| {
            log::error!("serving error: {e:?}");
        })?;

        tokio::select! {
            quit = service.waiting() => {
                quit?;
            }
            () = shutdown_token.cancelled() => {
                log::info!("Shutdown requested, closing stdio server");
            }
        }

        log::info!("Stdio server stopped");
        Ok(())
    }
}

impl<L: ToolLister> ServerHandler for StrictProxyServer<L> {
    fn get_info(&self) -> ServerInfo {
        let capabilities = if self.route.is_available() {
            ServerCapabilities::builder().enable_tools().build()
        } else {
            ServerCapabilities::default()
        };

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities,
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "KODEGEN strict-schema proxy - MCP tools with additionalProperties: false on every object schema".to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        self.route.list_tools(request).await
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let Some(peer) = &self.upstream else {
            return Err(McpError::invalid_request(
                "Tool execution is not available when serving a static catalog",
                Some(json!({ "tool": request.name })),
            ));
        };

        log::debug!("Proxying tool call '{}' to upstream server", request.name);

        peer.call_tool(request)
            .await
            .map_err(|e| upstream_error("tools/call", e))
    }
}
