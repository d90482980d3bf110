//! # wikimcp-mcp
//!
//! MCP (Model Context Protocol) server for wikimcp.
//!
//! This crate provides:
//! - JSON-RPC 2.0 and MCP message types
//! - A newline-delimited stdio transport
//! - The request router that exposes the wiki tools

pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;

pub use error::{McpError, TransportError};
pub use server::McpServer;
pub use transport::{StdioTransport, Transport};
