//! MCP-specific error types.

use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to write to the transport.
    #[error("write error: {0}")]
    WriteError(std::io::Error),

    /// Failed to read from the transport.
    #[error("read error: {0}")]
    ReadError(std::io::Error),

    /// The peer closed its end of the stream.
    #[error("connection closed")]
    ConnectionClosed,

    /// Transport is not connected.
    #[error("not connected")]
    NotConnected,
}

/// Errors that can occur while serving MCP.
///
/// Malformed messages never stop the server; they are answered with
/// JSON-RPC errors. Only the transport can fail the serve loop.
#[derive(Debug, Error)]
pub enum McpError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<McpError> for wikimcp_core::Error {
    fn from(e: McpError) -> Self {
        wikimcp_core::Error::Mcp(e.to_string())
    }
}
