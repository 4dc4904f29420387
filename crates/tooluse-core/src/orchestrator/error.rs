//! Orchestrator error types

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::providers::ProviderError;
use crate::session::SessionError;

/// Which model call of the two-pass protocol failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Query plus tool catalog, tool choice `auto`
    First,
    /// Augmented conversation, tool choice `none`
    Final,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::First => write!(f, "first"),
            Pass::Final => write!(f, "final"),
        }
    }
}

/// Errors that abort a query or a lifecycle step
///
/// Per-invocation tool failures never show up here; they are folded into
/// the conversation as tool messages.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Not connected to a tool server")]
    NotConnected,

    #[error("Model client has been released")]
    Released,

    #[error("Model client setup failed: {0}")]
    ModelClient(#[source] ProviderError),

    #[error("Connection failed: {0}")]
    Connection(#[source] SessionError),

    #[error("Tool discovery failed: {0}")]
    ToolDiscovery(#[source] SessionError),

    #[error("Malformed tool catalog: {0}")]
    MalformedToolDescriptor(#[source] SessionError),

    #[error("Model request failed during {pass} pass: {source}")]
    ModelRequest {
        pass: Pass,
        #[source]
        source: ProviderError,
    },

    #[error("Tool session failed while executing tools: {0}")]
    ToolExecution(#[source] SessionError),

    #[error("Query cancelled")]
    Cancelled,

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cleanup failed: {message}")]
    Cleanup { message: String },
}

impl OrchestratorError {
    /// Classify a `list_tools` failure
    pub fn discovery(error: SessionError) -> Self {
        match error {
            SessionError::MalformedToolDescriptor { .. } => OrchestratorError::MalformedToolDescriptor(error),
            other => OrchestratorError::ToolDiscovery(other),
        }
    }

    /// Report the first of several release failures
    pub fn cleanup(failures: &[String]) -> Self {
        let first = failures.first().cloned().unwrap_or_default();
        let message = match failures.len() {
            0 | 1 => first,
            n => format!("{} (and {} more)", first, n - 1),
        };
        OrchestratorError::Cleanup { message }
    }

    pub fn model_request(pass: Pass, source: ProviderError) -> Self {
        OrchestratorError::ModelRequest { pass, source }
    }

    /// The stage of the query that failed, for diagnostics
    pub fn stage(&self) -> &'static str {
        match self {
            OrchestratorError::NotConnected | OrchestratorError::Connection(_) => "connect",
            OrchestratorError::Released | OrchestratorError::ModelClient(_) => "model client",
            OrchestratorError::ToolDiscovery(_) | OrchestratorError::MalformedToolDescriptor(_) => "tool discovery",
            OrchestratorError::ModelRequest { pass: Pass::First, .. } => "first model call",
            OrchestratorError::ModelRequest { pass: Pass::Final, .. } => "final model call",
            OrchestratorError::ToolExecution(_) => "tool execution",
            OrchestratorError::Cancelled | OrchestratorError::Timeout(_) => "query",
            OrchestratorError::Cleanup { .. } => "cleanup",
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
