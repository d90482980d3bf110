//! Runs the MCP server over stdin/stdout.

use tracing::info;

use wikimcp_mcp::{McpServer, StdioTransport, Transport};
use wikimcp_tools::{ToolContext, ToolRegistry};

use crate::AppContext;

pub async fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let wiki = ctx.wikis.current().await?;
    info!(
        wiki = %ctx.wikis.current_id().await,
        server = %wiki.server(),
        config = %ctx.config_path.display(),
        "Starting wikimcp"
    );

    let server = McpServer::new(
        ToolRegistry::with_builtins(),
        ToolContext::new(ctx.wikis.clone()),
    );
    let mut transport = StdioTransport::stdio();

    server.serve(&mut transport).await?;
    transport.close().await?;
    Ok(())
}
