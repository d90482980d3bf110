//! Full-text page search.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use wikimcp_client::types::{SearchPageResponse, SearchResultObject};
use wikimcp_core::{ToolCall, ToolDefinition, ToolResult, WikiConfig};

use crate::registry::{parse_args, Tool, ToolContext};
use crate::ToolError;

const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct SearchPageArgs {
    query: String,
    #[serde(default)]
    limit: Option<u32>,
}

fn search_result(wiki: &WikiConfig, hit: &SearchResultObject) -> String {
    [
        format!("Title: {}", hit.title),
        format!("Description: {}", hit.description.as_deref().unwrap_or("Not available")),
        format!("Page ID: {}", hit.id),
        format!("Page URL: {}{}/{}", wiki.server(), wiki.article_path(), hit.key),
        format!(
            "Thumbnail URL: {}",
            hit.thumbnail
                .as_ref()
                .map(|t| t.url.as_str())
                .unwrap_or("Not available")
        ),
    ]
    .join("\n")
}

/// Searches page titles and contents.
pub struct SearchPageTool;

#[async_trait]
impl Tool for SearchPageTool {
    fn name(&self) -> &str {
        "search-page"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "search-page",
            "Search wiki page titles and contents for the provided search terms, and returns matching pages.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms"
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "description": "Maximum number of search results to return (1-100)"
                }
            },
            "required": ["query"]
        }))
        .with_title("Search page")
        .read_only()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        let args: SearchPageArgs = parse_args(arguments)?;
        match args.limit {
            Some(limit) if !(1..=MAX_LIMIT).contains(&limit) => Err(ToolError::invalid_args(
                format!("limit must be between 1 and {}, got {}", MAX_LIMIT, limit),
            )),
            _ => Ok(()),
        }
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: SearchPageArgs = parse_args(&call.arguments)?;

        let mut query = vec![("q", args.query.clone())];
        if let Some(limit) = args.limit {
            query.push(("limit", limit.to_string()));
        }

        let dispatcher = match ctx.dispatcher().await {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                return Ok(ToolResult::error(
                    &call.id,
                    format!("Failed to retrieve search data: {}", e),
                ))
            }
        };

        Ok(
            match dispatcher
                .rest_get::<SearchPageResponse>("/v1/search/page", &query, false)
                .await
            {
                Ok(results) if results.pages.is_empty() => {
                    ToolResult::success(&call.id, format!("No pages found for {}", args.query))
                }
                Ok(results) => ToolResult::blocks(
                    &call.id,
                    results
                        .pages
                        .iter()
                        .map(|hit| search_result(dispatcher.wiki(), hit))
                        .collect(),
                ),
                Err(e) => {
                    ToolResult::error(&call.id, format!("Failed to retrieve search data: {}", e))
                }
            },
        )
    }
}
