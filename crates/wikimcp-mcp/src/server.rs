//! MCP server: routes JSON-RPC requests to the wiki tools.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use wikimcp_core::ToolCall;
use wikimcp_tools::{ToolContext, ToolError, ToolRegistry};

use crate::error::{McpError, TransportError};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcMessage, JsonRpcResponse, ListToolsResult, McpToolDefinition, RequestId,
    ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::transport::Transport;

/// A tools-only MCP server over one wiki registry.
pub struct McpServer {
    tools: ToolRegistry,
    ctx: ToolContext,
    info: ServerInfo,
    next_call_id: AtomicU64,
}

impl McpServer {
    /// Create a server exposing `tools`.
    pub fn new(tools: ToolRegistry, ctx: ToolContext) -> Self {
        Self {
            tools,
            ctx,
            info: ServerInfo::default(),
            next_call_id: AtomicU64::new(1),
        }
    }

    /// The tool context shared by every call.
    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Serve requests from `transport` until the client hangs up.
    ///
    /// Requests are handled concurrently; responses are written as they
    /// complete, so they may arrive out of request order.
    pub async fn serve<T: Transport>(&self, transport: &mut T) -> Result<(), McpError> {
        info!(tools = self.tools.len(), "MCP server listening");
        let mut in_flight = FuturesUnordered::new();

        loop {
            tokio::select! {
                message = transport.receive() => match message {
                    Ok(line) => in_flight.push(self.handle_message(line)),
                    Err(TransportError::ConnectionClosed) => break,
                    Err(e) => return Err(e.into()),
                },
                Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(response) = response {
                        transport.send(&response).await?;
                    }
                }
            }
        }

        debug!(pending = in_flight.len(), "Input closed, draining in-flight requests");
        while let Some(response) = in_flight.next().await {
            if let Some(response) = response {
                transport.send(&response).await?;
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one raw message line. Returns the serialized response, or
    /// `None` for notifications.
    pub async fn handle_message(&self, line: String) -> Option<String> {
        let response = match serde_json::from_str::<Value>(&line) {
            Err(e) => Some(JsonRpcResponse::error(
                RequestId::Null,
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e)),
            )),
            Ok(value) => match serde_json::from_value::<JsonRpcMessage>(value.clone()) {
                Ok(message) => self.handle(message).await,
                Err(e) => Some(JsonRpcResponse::error(
                    request_id_of(&value),
                    JsonRpcError::new(
                        JsonRpcError::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    ),
                )),
            },
        }?;

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    /// Handle a parsed message.
    pub async fn handle(&self, message: JsonRpcMessage) -> Option<JsonRpcResponse> {
        let Some(id) = message.id else {
            self.handle_notification(&message.method);
            return None;
        };

        debug!(id = %id, method = %message.method, "Handling request");
        let params = message.params.unwrap_or(Value::Null);

        let result = match message.method.as_str() {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(params).await,
            method => Err(JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn initialize(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = if params.is_null() {
            parse_params(json!({}))?
        } else {
            parse_params(params)?
        };

        info!(
            client = %params.client_info.name,
            version = %params.client_info.version,
            protocol = %params.protocol_version,
            "Initializing MCP session"
        );

        to_result(InitializeResult {
            protocol_version: params.protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(ListToolsResult {
            tools: self
                .tools
                .definitions()
                .into_iter()
                .map(McpToolDefinition::from)
                .collect(),
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        let call = ToolCall::new(
            format!("call-{}", call_id),
            &params.name,
            params.arguments.unwrap_or_else(|| json!({})),
        );

        let result = match self.tools.execute(&call, &self.ctx).await {
            Ok(result) => CallToolResult::from(result),
            Err(ToolError::NotFound(name)) => {
                return Err(JsonRpcError::new(
                    JsonRpcError::INVALID_PARAMS,
                    format!("Unknown tool: {}", name),
                ))
            }
            Err(e @ (ToolError::InvalidArguments(_) | ToolError::MissingParameter(_))) => {
                return Err(JsonRpcError::new(JsonRpcError::INVALID_PARAMS, e.to_string()))
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                CallToolResult::error(e.to_string())
            }
        };

        to_result(result)
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("Invalid params: {}", e))
    })
}

fn to_result<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}

/// Best-effort ID of a message that failed to parse as a request.
fn request_id_of(value: &Value) -> RequestId {
    value
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
        .unwrap_or(RequestId::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wikimcp_client::WikiRegistry;
    use wikimcp_core::Config;

    fn server() -> McpServer {
        let wikis = WikiRegistry::from_config(&Config::default()).unwrap();
        McpServer::new(ToolRegistry::with_builtins(), ToolContext::new(Arc::new(wikis)))
    }

    async fn request(server: &McpServer, line: &str) -> Value {
        let response = server.handle_message(line.to_string()).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let server = server();
        let response = request(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test","version":"1"}}}"#,
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert_eq!(response["result"]["serverInfo"]["name"], "wikimcp");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string())
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let response = request(&server(), r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(response["id"], "p");
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response =
            request(&server(), r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).await;
        assert_eq!(response["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let response = request(&server(), "{not json").await;
        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_missing_method_is_invalid_request() {
        let response = request(&server(), r#"{"jsonrpc":"2.0","id":7}"#).await;
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = request(&server(), r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);

        let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
        assert!(names.contains(&"get-page"));
        assert!(names.contains(&"set-wiki"));

        let update = tools.iter().find(|t| t["name"] == "update-page").unwrap();
        assert_eq!(update["annotations"]["destructiveHint"], true);
        assert_eq!(update["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let response = request(
            &server(),
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"delete-page","arguments":{}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_call_with_bad_arguments() {
        let response = request(
            &server(),
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"search-page","arguments":{"query":"x","limit":0}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);

        let response = request(
            &server(),
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_call_set_wiki_for_configured_wiki() {
        let server = server();
        let response = request(
            &server,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"set-wiki","arguments":{"wikiUrl":"http://localhost:8080/wiki/Main_Page"}}}"#,
        )
        .await;

        assert_eq!(response["result"]["isError"], false);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Wiki set to"), "{}", text);
        assert_eq!(server.context().wikis.current_id().await, "localhost:8080");
    }
}
