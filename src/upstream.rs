//! Upstream MCP server spawned as a child process.
//!
//! The proxy connects to the upstream over stdio, lists its tools through the
//! strict wrapper and forwards tool calls to it unchanged.

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, RoleClient, ServiceExt,
    model::{ListToolsResult, PaginatedRequestParam, ServerInfo},
    service::{Peer, RunningService, ServiceError},
    transport::TokioChildProcess,
};
use tokio::process::Command;

use crate::install::ToolService;
use crate::lister::ToolLister;

/// Convert an rmcp client-side error into the error returned to our own
/// clients. Protocol errors from the upstream are passed through as they are.
pub fn upstream_error(operation: &str, error: ServiceError) -> McpError {
    match error {
        ServiceError::McpError(e) => e,
        other => McpError::internal_error(format!("Upstream {operation} failed: {other}"), None),
    }
}

/// A running connection to an upstream MCP server
pub struct UpstreamService {
    service: RunningService<RoleClient, ()>,
}

impl UpstreamService {
    /// Spawn `program` with `args` and complete the MCP handshake
    pub async fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut command = Command::new(program);
        command.args(args);

        log::debug!("Spawning upstream MCP server: {} {}", program, args.join(" "));

        let transport = TokioChildProcess::new(command)
            .with_context(|| format!("Failed to spawn upstream MCP server: {program}"))?;

        let service = ()
            .serve(transport)
            .await
            .with_context(|| format!("MCP handshake with upstream '{program}' failed"))?;

        if let Some(info) = service.peer_info() {
            log::info!(
                "Connected to upstream MCP server {} {}",
                info.server_info.name,
                info.server_info.version
            );
        }

        Ok(Self { service })
    }

    /// Handle for issuing requests to the upstream
    pub fn peer(&self) -> Peer<RoleClient> {
        self.service.peer().clone()
    }

    /// What the upstream announced during initialization
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.service.peer_info()
    }

    /// Whether the upstream advertised the tools capability
    pub fn advertises_tools(&self) -> bool {
        self.server_info()
            .is_some_and(|info| info.capabilities.tools.is_some())
    }

    /// Close the connection and stop the child process
    pub async fn shutdown(self) -> Result<()> {
        let reason = self.service.cancel().await?;
        log::debug!("Upstream MCP server stopped: {reason:?}");
        Ok(())
    }
}

/// Lists tools by asking the upstream
#[derive(Clone)]
pub struct UpstreamLister {
    peer: Peer<RoleClient>,
}

impl UpstreamLister {
    pub fn new(peer: Peer<RoleClient>) -> Self {
        Self { peer }
    }
}

impl ToolLister for UpstreamLister {
    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, McpError> {
        self.peer
            .list_tools(request)
            .await
            .map_err(|e| upstream_error("tools/list", e))
    }
}

impl ToolService for UpstreamService {
    type Lister = UpstreamLister;

    fn tool_lister(&self) -> Option<UpstreamLister> {
        self.advertises_tools().then(|| UpstreamLister::new(self.peer()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_pass_through() {
        let original = McpError::invalid_params("missing field 'path'", None);

        let mapped = upstream_error("tools/call", ServiceError::McpError(original.clone()));

        assert_eq!(mapped.code, original.code);
        assert_eq!(mapped.message, original.message);
    }

    #[test]
    fn test_transport_errors_become_internal_errors() {
        let mapped = upstream_error("tools/list", ServiceError::TransportClosed);

        assert_eq!(mapped.code, rmcp::model::ErrorCode::INTERNAL_ERROR);
        assert!(mapped.message.starts_with("Upstream tools/list failed"));
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let result = UpstreamService::spawn("kodegen-strict-test-no-such-binary", &[]).await;

        let message = format!("{:#}", result.err().expect("spawn should fail"));
        assert!(message.contains("kodegen-strict-test-no-such-binary"));
    }
}
