//! MCP (Model Context Protocol) transport session
//!
//! Uses the official rmcp SDK to connect to tool servers. Streamable HTTP,
//! stdio child processes and Unix sockets are interchangeable behind
//! [`crate::session::ToolSession`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tooluse_core::mcp::{McpSession, ServerEndpoint};
//! use tooluse_core::session::ToolSession;
//!
//! let session = McpSession::open(&ServerEndpoint::default(), logger).await?;
//! let catalog = session.list_tools().await?;
//! let text = session.invoke("add", args).await?;
//! session.close().await?;
//! ```

mod client;
mod endpoint;

pub use client::McpSession;
pub use endpoint::{ServerEndpoint, DEFAULT_SERVER_URL};

// Re-export rmcp types that consumers might need
pub use rmcp::model::Tool as McpTool;
