//! # wikimcp-core
//!
//! Core types and abstractions for wikimcp, the MediaWiki MCP server.
//!
//! This crate provides:
//! - Wiki configuration and the configuration loader
//! - Tool definitions and execution result types
//! - Common error types, including the MediaWiki API error taxonomy

pub mod config;
pub mod error;
pub mod tool;

pub use config::{Config, HttpConfig, WikiConfig};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
