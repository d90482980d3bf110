//! # wikimcp-tools
//!
//! The wiki tools exposed over MCP.
//!
//! This crate provides:
//! - Page tools (get, history, create, update)
//! - Search and file lookup
//! - Switching the current wiki
//!
//! ## Architecture
//!
//! Tools implement the [`Tool`] trait and are registered with a [`ToolRegistry`].
//! Each call receives a [`ToolContext`] holding the shared wiki registry, from
//! which the tool takes a dispatcher bound to the current wiki.
//!
//! ## Example
//!
//! ```ignore
//! use wikimcp_tools::{ToolContext, ToolRegistry};
//!
//! let registry = ToolRegistry::with_builtins();
//! let ctx = ToolContext::new(wikis);
//! let call = ToolCall::new("1", "get-page", json!({"title": "Main Page"}));
//! let result = registry.execute(&call, &ctx).await?;
//! ```

use std::sync::Arc;

use thiserror::Error;

pub mod file;
pub mod page;
pub mod registry;
pub mod search;
pub mod wiki;

pub use registry::{Tool, ToolContext, ToolRegistry};

pub use file::GetFileTool;
pub use page::{CreatePageTool, GetPageHistoryTool, GetPageTool, UpdatePageTool};
pub use search::SearchPageTool;
pub use wiki::SetWikiTool;

impl ToolRegistry {
    /// Create a registry with every wiki tool registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(GetPageTool));
        registry.register(Arc::new(GetPageHistoryTool));
        registry.register(Arc::new(SearchPageTool));
        registry.register(Arc::new(SetWikiTool));
        registry.register(Arc::new(UpdatePageTool));
        registry.register(Arc::new(GetFileTool));
        registry.register(Arc::new(CreatePageTool));

        registry
    }
}

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments provided to the tool.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Required parameter is missing.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// The wiki could not be reached or rejected the request.
    #[error(transparent)]
    Api(#[from] wikimcp_core::ApiError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Create an invalid arguments error.
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a missing parameter error.
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }
}

impl From<ToolError> for wikimcp_core::Error {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Api(api) => wikimcp_core::Error::Api(api),
            ToolError::Json(json) => wikimcp_core::Error::Json(json),
            other => wikimcp_core::Error::Tool(other.to_string()),
        }
    }
}
