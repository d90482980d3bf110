//! Switching the wiki that the other tools talk to.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

use wikimcp_client::{discover, origin_of};
use wikimcp_core::{ToolCall, ToolDefinition, ToolResult};

use crate::registry::{parse_args, Tool, ToolContext};
use crate::ToolError;

const DISCOVERY_FAILED: &str =
    "Failed to determine wiki info. Please ensure the URL is correct and the wiki is accessible.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetWikiArgs {
    wiki_url: String,
}

/// Registry key for a wiki URL: host, plus the port when one is given.
fn wiki_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Selects the wiki used by subsequent tool calls.
///
/// Wikis missing from the configuration are discovered through their
/// siteinfo and added for the rest of the process lifetime.
pub struct SetWikiTool;

#[async_trait]
impl Tool for SetWikiTool {
    fn name(&self) -> &str {
        "set-wiki"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("set-wiki", "Set the wiki to use for the current session.")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "wikiUrl": {
                        "type": "string",
                        "format": "uri",
                        "description": "Any URL from the target wiki (e.g. https://en.wikipedia.org/wiki/Main_Page)."
                    }
                },
                "required": ["wikiUrl"]
            }))
            .with_title("Set wiki")
            .destructive()
    }

    fn validate(&self, arguments: &Value) -> Result<(), ToolError> {
        let args: SetWikiArgs = parse_args(arguments)?;
        let url = Url::parse(&args.wiki_url)
            .map_err(|e| ToolError::invalid_args(format!("wikiUrl is not a valid URL: {}", e)))?;
        if wiki_key(&url).is_none() {
            return Err(ToolError::invalid_args("wikiUrl has no host"));
        }
        Ok(())
    }

    async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: SetWikiArgs = parse_args(&call.arguments)?;
        let url = Url::parse(&args.wiki_url).map_err(|e| ToolError::invalid_args(e.to_string()))?;
        let key = wiki_key(&url).ok_or_else(|| ToolError::invalid_args("wikiUrl has no host"))?;

        if !ctx.wikis.contains(&key).await {
            let origin = origin_of(&args.wiki_url)?;
            let Some(info) = discover(ctx.wikis.http(), &origin).await else {
                return Ok(ToolResult::error(&call.id, DISCOVERY_FAILED));
            };
            info!(wiki = %key, sitename = %info.sitename, "Discovered wiki");
            ctx.wikis.update_wiki_config(&key, info.into_config()).await;
        }

        ctx.wikis.set_current_wiki(&key).await?;
        let wiki = ctx.wikis.current().await?;

        Ok(ToolResult::success(
            &call.id,
            format!("Wiki set to {} ({})", wiki.sitename, wiki.server()),
        ))
    }
}
