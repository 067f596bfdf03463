//! Model Context Protocol (MCP) tool collections
//!
//! Lets an out-of-process MCP server (stdio transport) act as one of the
//! agent's tool collections.
//!
//! - `client`: JSON-RPC 2.0 client over the server's stdin/stdout
//! - `collection`: adapts a connected server to the `ToolCollection` trait
//! - `types`: MCP protocol types
pub mod client;
pub mod collection;
pub mod types;

pub use client::McpClient;
pub use collection::McpToolCollection;
pub use types::{
    McpError, McpServerConfig, McpTool, McpToolResult, DEFAULT_PROTOCOL_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};
