//! Page tools: read a page, list its history, create and update pages.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use wikimcp_client::types::{PageHistoryResponse, PageObject, RevisionObject};
use wikimcp_core::{ToolCall, ToolDefinition, ToolResult, WikiConfig};

use crate::registry::{parse_args, Tool, ToolContext};
use crate::ToolError;

const NOT_AVAILABLE: &str = "Not available";

/// Percent-encode a title for use as one REST path segment.
pub(crate) fn encode_title(title: &str) -> String {
    urlencoding::encode(title).into_owned()
}

/// The fields shared by every page response.
fn page_summary(page: &PageObject) -> String {
    [
        format!("Page ID: {}", page.id),
        format!("Title: {}", page.title),
        format!("Latest revision ID: {}", page.latest.id),
        format!("Latest revision timestamp: {}", page.latest.timestamp),
        format!("Content model: {}", page.content_model),
        format!("License: {} {}", page.license.url, page.license.title),
        format!("HTML URL: {}", page.html_url.as_deref().unwrap_or(NOT_AVAILABLE)),
    ]
    .join("\n")
}

// ============================================================================
// get-page
// ============================================================================

/// Which representation of the page to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentFormat {
    #[default]
    NoContent,
    WithSource,
    WithHtml,
}

impl ContentFormat {
    fn endpoint_suffix(self) -> &'static str {
        match self {
            ContentFormat::NoContent => "/bare",
            ContentFormat::WithSource => "",
            ContentFormat::WithHtml => "/with_html",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetPageArgs {
    title: String,
    #[serde(default)]
    content: ContentFormat,
}

/// Returns the standard page object, optionally with source or HTML.
pub struct GetPageTool;

#[async_trait]
impl Tool for GetPageTool {
    fn name(&self) -> &str {
        "get-page"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get-page",
            "Returns the standard page object for a wiki page, optionally including page source \
             or rendered HTML, and including the license and information about the latest revision.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Wiki page title"
                },
                "content": {
                    "type": "string",
                    "enum": ["noContent", "withSource", "withHtml"],
                    "default": "noContent",
                    "description": "Format of the page content to retrieve"
                }
            },
            "required": ["title"]
        }))
        .with_title("Get page")
        .read_only()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        parse_args::<GetPageArgs>(arguments).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: GetPageArgs = parse_args(&call.arguments)?;
        let path = format!(
            "/v1/page/{}{}",
            encode_title(&args.title),
            args.content.endpoint_suffix()
        );

        let result = match ctx.dispatcher().await {
            Ok(dispatcher) => dispatcher.rest_get::<PageObject>(&path, &[], false).await,
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(page) => {
                let mut blocks = vec![page_summary(&page)];
                if let Some(source) = page.source {
                    blocks.push(format!("Source:\n{}", source));
                }
                if let Some(html) = page.html {
                    blocks.push(format!("HTML:\n{}", html));
                }
                ToolResult::blocks(&call.id, blocks)
            }
            Err(e) => ToolResult::error(&call.id, format!("Failed to retrieve page data: {}", e)),
        })
    }
}

// ============================================================================
// get-page-history
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetPageHistoryArgs {
    title: String,
    #[serde(default)]
    older_than: Option<u64>,
    #[serde(default)]
    newer_than: Option<u64>,
    #[serde(default)]
    filter: Option<String>,
}

impl GetPageHistoryArgs {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(id) = self.older_than.filter(|id| *id > 0) {
            query.push(("olderThan", id.to_string()));
        }
        if let Some(id) = self.newer_than.filter(|id| *id > 0) {
            query.push(("newerThan", id.to_string()));
        }
        if let Some(filter) = self.filter.as_deref().filter(|f| !f.is_empty()) {
            query.push(("filter", filter.to_string()));
        }
        query
    }
}

fn revision_summary(revision: &RevisionObject) -> String {
    let user_id = revision
        .user
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    [
        format!("Revision ID: {}", revision.id),
        format!("Timestamp: {}", revision.timestamp),
        format!("User: {} (ID: {})", revision.user.name, user_id),
        format!("Comment: {}", revision.comment.as_deref().unwrap_or("")),
        format!("Size: {}", revision.size),
        format!("Delta: {}", revision.delta),
    ]
    .join("\n")
}

/// Lists revisions of a page, 20 at a time, newest first.
pub struct GetPageHistoryTool;

#[async_trait]
impl Tool for GetPageHistoryTool {
    fn name(&self) -> &str {
        "get-page-history"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get-page-history",
            "Returns information about the latest revisions to a wiki page, in segments of 20 \
             revisions, starting with the latest revision. The response includes API routes for \
             the next oldest, next newest, and latest revision segments.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Wiki page title"
                },
                "olderThan": {
                    "type": "integer",
                    "description": "The ID of the oldest revision to return"
                },
                "newerThan": {
                    "type": "integer",
                    "description": "The ID of the newest revision to return"
                },
                "filter": {
                    "type": "string",
                    "description": "Filter that returns only revisions with certain tags. Only support one filter per request."
                }
            },
            "required": ["title"]
        }))
        .with_title("Get page history")
        .read_only()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        parse_args::<GetPageHistoryArgs>(arguments).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: GetPageHistoryArgs = parse_args(&call.arguments)?;
        let path = format!("/v1/page/{}/history", encode_title(&args.title));

        let result = match ctx.dispatcher().await {
            Ok(dispatcher) => {
                dispatcher
                    .rest_get::<PageHistoryResponse>(&path, &args.query(), false)
                    .await
            }
            Err(e) => Err(e),
        };

        Ok(match result {
            Ok(history) if history.revisions.is_empty() => {
                ToolResult::success(&call.id, "No revisions found for page")
            }
            Ok(history) => ToolResult::blocks(
                &call.id,
                history.revisions.iter().map(revision_summary).collect(),
            ),
            Err(e) => ToolResult::error(&call.id, format!("Failed to retrieve page history: {}", e)),
        })
    }
}

// ============================================================================
// create-page / update-page
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePageArgs {
    source: String,
    title: String,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    content_model: Option<String>,
}

impl CreatePageArgs {
    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("source".to_string(), json!(self.source));
        body.insert("title".to_string(), json!(self.title));
        body.insert("comment".to_string(), json!(self.comment.as_deref().unwrap_or("")));
        if let Some(model) = &self.content_model {
            body.insert("content_model".to_string(), json!(model));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePageArgs {
    title: String,
    source: String,
    latest_id: u64,
    #[serde(default)]
    comment: Option<String>,
}

impl UpdatePageArgs {
    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("source".to_string(), json!(self.source));
        if let Some(comment) = &self.comment {
            body.insert("comment".to_string(), json!(comment));
        }
        body.insert("latest".to_string(), json!({ "id": self.latest_id }));
        Value::Object(body)
    }
}

/// Text blocks for a page that was just written.
fn edit_result(wiki: &WikiConfig, verb: &str, page: &PageObject) -> Vec<String> {
    vec![
        format!("Page {} successfully: {}", verb, wiki.page_url(&page.title)),
        format!("Page object:\n{}", page_summary(page)),
    ]
}

/// Creates a page.
pub struct CreatePageTool;

#[async_trait]
impl Tool for CreatePageTool {
    fn name(&self) -> &str {
        "create-page"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("create-page", "Creates a wiki page with the provided content.")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "source": {
                        "type": "string",
                        "description": "Page content in the format specified by the contentModel parameter"
                    },
                    "title": {
                        "type": "string",
                        "description": "Wiki page title"
                    },
                    "comment": {
                        "type": "string",
                        "description": "Reason for creating the page"
                    },
                    "contentModel": {
                        "type": "string",
                        "description": "Type of content on the page. Defaults to \"wikitext\""
                    }
                },
                "required": ["source", "title"]
            }))
            .with_title("Create page")
            .destructive()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        parse_args::<CreatePageArgs>(arguments).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: CreatePageArgs = parse_args(&call.arguments)?;

        let dispatcher = match ctx.dispatcher().await {
            Ok(dispatcher) => dispatcher,
            Err(e) => return Ok(ToolResult::error(&call.id, format!("Failed to create page: {}", e))),
        };

        Ok(
            match dispatcher
                .rest_post::<PageObject>("/v1/page", args.body(), true)
                .await
            {
                Ok(page) => {
                    ToolResult::blocks(&call.id, edit_result(dispatcher.wiki(), "created", &page))
                }
                Err(e) => ToolResult::error(&call.id, format!("Failed to create page: {}", e)),
            },
        )
    }
}

/// Replaces the content of an existing page.
pub struct UpdatePageTool;

#[async_trait]
impl Tool for UpdatePageTool {
    fn name(&self) -> &str {
        "update-page"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update-page",
            "Updates a wiki page. Replaces the existing content of a page with the provided content",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Wiki page title"
                },
                "source": {
                    "type": "string",
                    "description": "Page content in the same content model of the existing page"
                },
                "latestId": {
                    "type": "integer",
                    "description": "Identifier for the revision used as the base for the new source"
                },
                "comment": {
                    "type": "string",
                    "description": "Summary of the edit"
                }
            },
            "required": ["title", "source", "latestId"]
        }))
        .with_title("Update page")
        .destructive()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        parse_args::<UpdatePageArgs>(arguments).map(|_| ())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: UpdatePageArgs = parse_args(&call.arguments)?;
        let path = format!("/v1/page/{}", encode_title(&args.title));

        let dispatcher = match ctx.dispatcher().await {
            Ok(dispatcher) => dispatcher,
            Err(e) => return Ok(ToolResult::error(&call.id, format!("Failed to update page: {}", e))),
        };

        Ok(
            match dispatcher.rest_put::<PageObject>(&path, args.body(), true).await {
                Ok(page) => {
                    ToolResult::blocks(&call.id, edit_result(dispatcher.wiki(), "updated", &page))
                }
                Err(e) => ToolResult::error(&call.id, format!("Failed to update page: {}", e)),
            },
        )
    }
}
