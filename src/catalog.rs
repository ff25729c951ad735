//! Static tool catalog loaded from a JSON file.
//!
//! File format uses MCP field names:
//!
//! ```json
//! {
//!   "tools": [
//!     {
//!       "name": "fs_read_file",
//!       "description": "Read a file",
//!       "inputSchema": { "type": "object", "properties": { "path": { "type": "string" } } }
//!     }
//!   ]
//! }
//! ```
//!
//! A file without a `tools` key describes a source that cannot list tools.

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError,
    model::{ListToolsResult, PaginatedRequestParam, Tool},
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::install::ToolService;
use crate::lister::ToolLister;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tools: Option<Vec<Tool>>,
}

/// Tool metadata served without any upstream server
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Option<Arc<Vec<Tool>>>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            tools: Some(Arc::new(tools)),
        }
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tool catalog: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse tool catalog as JSON: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Ok(Self {
            tools: file.tools.map(Arc::new),
        })
    }

    /// Number of tools, or `None` if the catalog has no tool list
    pub fn tool_count(&self) -> Option<usize> {
        self.tools.as_ref().map(|tools| tools.len())
    }
}

/// Lists the catalog's tools. Each call returns a fresh clone.
#[derive(Debug, Clone)]
pub struct CatalogLister {
    tools: Arc<Vec<Tool>>,
}

impl ToolLister for CatalogLister {
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, McpError> {
        log::debug!("Serving {} tools from static catalog", self.tools.len());
        Ok(ListToolsResult::with_all_items(self.tools.as_ref().clone()))
    }
}

impl ToolService for ToolCatalog {
    type Lister = CatalogLister;

    fn tool_lister(&self) -> Option<CatalogLister> {
        self.tools.clone().map(|tools| CatalogLister { tools })
    }
}
