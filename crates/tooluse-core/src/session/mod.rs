//! Transport session abstraction
//!
//! A [`ToolSession`] is a live, initialized connection to a tool server. The
//! orchestrator only ever sees this trait, so the streamable HTTP, stdio and
//! Unix socket transports of [`crate::mcp::McpSession`] are interchangeable,
//! and tests can substitute [`MockToolSession`].

mod mock;

pub use mock::{MockToolSession, ToolHandler};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::ToolCatalog;

/// Arguments passed to a tool: a JSON object
pub type JsonObject = Map<String, Value>;

/// Session errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    #[error("Tool discovery failed: {0}")]
    Discovery(String),

    #[error("Malformed tool descriptor at position {index}: {reason}")]
    MalformedToolDescriptor { index: usize, reason: String },

    #[error("Tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool {tool} failed: {message}")]
    RemoteExecution { tool: String, message: String },

    #[error("Session is closed")]
    Closed,

    #[error("Failed to close session: {0}")]
    Close(String),
}

impl SessionError {
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn invalid_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn remote_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Errors scoped to a single tool invocation
    ///
    /// These are recoverable: the orchestrator turns them into tool result
    /// messages instead of aborting the query.
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            SessionError::ToolNotFound { .. }
                | SessionError::InvalidArguments { .. }
                | SessionError::RemoteExecution { .. }
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A live, initialized connection to a tool server
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Human-readable endpoint description for diagnostics
    fn endpoint(&self) -> String;

    /// Server-assigned session identifier, when the transport exposes one
    fn session_id(&self) -> Option<String>;

    /// Fetch the server's current tool catalog, in discovery order
    async fn list_tools(&self) -> SessionResult<ToolCatalog>;

    /// Invoke `tool_name` and return the text of the first content item
    /// (empty when the tool returned no content)
    async fn invoke(&self, tool_name: &str, arguments: JsonObject) -> SessionResult<String>;

    /// Release the channel. Idempotent.
    async fn close(&self) -> SessionResult<()>;
}
