//! The `tools/list` capability and its strict-schema wrapper.

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{JsonObject, ListToolsResult, PaginatedRequestParam, Tool},
};

use crate::schema::SchemaNormalizer;

/// An asynchronous source of tool descriptors.
///
/// Pagination requests are handed through untouched. Each call is expected to
/// return a fresh [`ListToolsResult`]; descriptors may still share their
/// schema `Arc`s with a cache, which [`StrictToolLister`] copies on write.
pub trait ToolLister: Send + Sync + 'static {
    fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send;
}

/// Wraps a [`ToolLister`] so every schema it returns is strict.
///
/// The wrapped lister runs unmodified and its errors propagate unchanged.
/// Tool order and count are preserved; tools with an empty input schema are
/// left as they are.
#[derive(Debug, Clone)]
pub struct StrictToolLister<L> {
    inner: L,
    normalizer: SchemaNormalizer,
    output_schemas: bool,
}

impl<L: ToolLister> StrictToolLister<L> {
    pub fn new(inner: L, normalizer: SchemaNormalizer) -> Self {
        Self {
            inner,
            normalizer,
            output_schemas: false,
        }
    }

    /// Also normalize each tool's `outputSchema`
    pub fn with_output_schemas(mut self, enabled: bool) -> Self {
        self.output_schemas = enabled;
        self
    }

    /// The original, unwrapped lister
    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }

    pub fn normalizer(&self) -> &SchemaNormalizer {
        &self.normalizer
    }

    pub fn output_schemas(&self) -> bool {
        self.output_schemas
    }

    /// Normalize the schemas of `tools` in place.
    pub fn normalize_tools(&self, tools: &mut [Tool]) {
        for tool in tools.iter_mut() {
            if self.normalize_schema(&tool.name, "input", &mut tool.input_schema) {
                log::debug!("Patched schema for tool: {}", tool.name);
            }

            if self.output_schemas
                && let Some(schema) = tool.output_schema.as_mut()
                && self.normalize_schema(&tool.name, "output", schema)
            {
                log::debug!("Patched output schema for tool: {}", tool.name);
            }
        }
    }

    /// Returns true if the schema was present and normalized.
    fn normalize_schema(&self, tool_name: &str, kind: &str, schema: &mut Arc<JsonObject>) -> bool {
        if schema.is_empty() {
            return false;
        }

        // Copies the map first if a cache still holds the same Arc
        match self.normalizer.normalize_object(Arc::make_mut(schema)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Leaving {kind} schema of tool '{tool_name}' unchanged: {e}");
                false
            }
        }
    }
}

impl<L: ToolLister> ToolLister for StrictToolLister<L> {
    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, McpError> {
        let mut result = self.inner.list_tools(request).await?;
        self.normalize_tools(&mut result.tools);
        Ok(result)
    }
}

/// The listing capability a server registers.
#[derive(Debug, Clone)]
pub enum ToolRoute<L> {
    /// Listing goes through the strict wrapper
    Strict(StrictToolLister<L>),
    /// Installation failed; the original lister is served as is
    Passthrough(L),
    /// The source exposes no listing capability
    Unavailable,
}

impl<L: ToolLister> ToolRoute<L> {
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict(_))
    }
}

impl<L: ToolLister> ToolLister for ToolRoute<L> {
    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, McpError> {
        match self {
            Self::Strict(lister) => lister.list_tools(request).await,
            Self::Passthrough(lister) => lister.list_tools(request).await,
            Self::Unavailable => Ok(ListToolsResult::with_all_items(Vec::new())),
        }
    }
}
