//! Tool definitions and execution types.

use serde::{Deserialize, Serialize};

/// Behavioural hints advertised to MCP clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    /// Human-readable title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The tool does not modify the wiki
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    /// The tool may overwrite or change state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
}

/// Definition of a tool exposed to the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique identifier)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
    /// MCP annotations
    pub annotations: ToolAnnotations,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            annotations: ToolAnnotations::default(),
        }
    }

    /// Set the parameters schema.
    pub fn with_parameters(mut self, schema: serde_json::Value) -> Self {
        self.parameters = schema;
        self
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.annotations.title = Some(title.into());
        self
    }

    /// Mark as read-only.
    pub fn read_only(mut self) -> Self {
        self.annotations.read_only_hint = Some(true);
        self.annotations.destructive_hint = Some(false);
        self
    }

    /// Mark as destructive.
    pub fn destructive(mut self) -> Self {
        self.annotations.read_only_hint = Some(false);
        self.annotations.destructive_hint = Some(true);
        self
    }

    /// Whether this tool modifies the wiki.
    pub fn is_destructive(&self) -> bool {
        self.annotations.destructive_hint.unwrap_or(false)
    }
}

/// A request to call a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool arguments
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Result of a tool execution.
///
/// `content` holds one or more text blocks; MCP clients render each as a
/// separate text content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    pub tool_call_id: String,
    /// Whether execution succeeded
    pub success: bool,
    /// Text blocks
    pub content: Vec<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result with a single text block.
    pub fn success(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::blocks(tool_call_id, vec![output.into()])
    }

    /// Create a successful result with several text blocks.
    pub fn blocks(tool_call_id: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: true,
            content,
            duration_ms: 0,
        }
    }

    /// Create a failed result.
    pub fn error(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: false,
            content: vec![error.into()],
            duration_ms: 0,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// All text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_serialize_camel_case() {
        let def = ToolDefinition::new("get-page", "Returns a page").with_title("Get page").read_only();
        let json = serde_json::to_value(&def.annotations).unwrap();
        assert_eq!(json["readOnlyHint"], true);
        assert_eq!(json["destructiveHint"], false);
        assert_eq!(json["title"], "Get page");
        assert!(!def.is_destructive());
    }

    #[test]
    fn test_error_result() {
        let result = ToolResult::error("1", "Failed to update page: boom");
        assert!(!result.success);
        assert_eq!(result.text(), "Failed to update page: boom");
    }
}
