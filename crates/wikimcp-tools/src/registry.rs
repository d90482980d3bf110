//! Tool registry for managing available tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use wikimcp_client::{RequestDispatcher, WikiRegistry};
use wikimcp_core::{ApiError, ToolCall, ToolDefinition, ToolResult};

use crate::ToolError;

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Configured wikis and the current selection
    pub wikis: Arc<WikiRegistry>,
}

impl ToolContext {
    /// Create a context over a shared wiki registry.
    pub fn new(wikis: Arc<WikiRegistry>) -> Self {
        Self { wikis }
    }

    /// Dispatcher bound to the wiki that is current right now.
    pub async fn dispatcher(&self) -> Result<RequestDispatcher, ApiError> {
        self.wikis.dispatcher().await
    }
}

/// Trait for implementing tools.
///
/// Each tool has a name, a definition (including the JSON schema for its
/// arguments) and an async execute method. Failures the caller should see
/// are returned as error results; `Err` is reserved for calls that could not
/// be run at all.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of this tool.
    fn name(&self) -> &str;

    /// Get the tool definition including parameter schema.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given call and context.
    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError>;

    /// Validate the arguments before execution.
    ///
    /// Default implementation does no validation.
    fn validate(&self, _arguments: &serde_json::Value) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Decode tool arguments into a typed struct.
pub fn parse_args<T: DeserializeOwned>(arguments: &serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|e| ToolError::invalid_args(e.to_string()))
}

/// Registry of available tools, ordered by name.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names.
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get all tool definitions.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call.
    pub async fn execute(
        &self,
        call: &ToolCall,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        // Validate arguments first
        tool.validate(&call.arguments)?;

        let start = std::time::Instant::now();
        let mut result = tool.execute(call, ctx).await?;
        result.duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            tool = %call.name,
            success = result.success,
            duration_ms = result.duration_ms,
            "Tool call finished"
        );
        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
