//! File metadata lookup.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use wikimcp_client::types::FileObject;
use wikimcp_core::{ToolCall, ToolDefinition, ToolResult};

use crate::page::encode_title;
use crate::registry::{parse_args, Tool, ToolContext};
use crate::ToolError;

#[derive(Debug, Deserialize)]
struct GetFileArgs {
    title: String,
}

fn file_summary(file: &FileObject) -> String {
    [
        format!("File title: {}", file.title),
        format!("File description URL: {}", file.file_description_url),
        format!("Latest revision timestamp: {}", file.latest.timestamp),
        format!("Latest revision user: {}", file.latest.user.name),
        format!("Preferred URL: {}", file.preferred.url),
        format!("Original URL: {}", file.original.url),
        format!(
            "Thumbnail URL: {}",
            file.thumbnail
                .as_ref()
                .map(|t| t.url.as_str())
                .unwrap_or("Not available")
        ),
    ]
    .join("\n")
}

/// Returns download links for a file.
pub struct GetFileTool;

#[async_trait]
impl Tool for GetFileTool {
    fn name(&self) -> &str {
        "get-file"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get-file",
            "Returns information about a file, including links to download the file in thumbnail, \
             preview, and original formats.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "File title"
                }
            },
            "required": ["title"]
        }))
        .with_title("Get file")
        .read_only()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        parse_args::<GetFileArgs>(arguments).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: GetFileArgs = parse_args(&call.arguments)?;
        let path = format!("/v1/file/{}", encode_title(&args.title));

        let result = match ctx.dispatcher().await {
            Ok(dispatcher) => dispatcher.rest_get::<FileObject>(&path, &[], false).await,
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(file) => ToolResult::success(&call.id, file_summary(&file)),
            Err(e) => ToolResult::error(&call.id, format!("Failed to retrieve file data: {}", e)),
        })
    }
}
