//! Tooluse Core
//!
//! Connects a chat model to an MCP tool server and answers queries with a
//! bounded, two-pass tool-calling protocol. Runtime agnostic apart from
//! tokio; the `tooluse` CLI is a thin driver over this crate.
//!
//! ## Query flow
//!
//! - Open a [`session::ToolSession`] (streamable HTTP, stdio or Unix socket)
//! - Discover the tool catalog and translate it into function specs
//! - Ask the model with tool choice `auto`
//! - Run any requested tools, folding their results into the conversation
//! - Ask again with tool choice `none` and return the text
//!
//! ```rust,ignore
//! use tooluse_core::{run_scoped, ConfigFile, OrchestratorContext, TracingLogger};
//!
//! let config = ConfigFile::default();
//! let context = OrchestratorContext::from_config(&config, Arc::new(TracingLogger::default()))?;
//! let answer = run_scoped(context, &config.server, |ctx| {
//!     Box::pin(async move { ctx.process_query("what is 2+3?").await })
//! })
//! .await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod providers;
pub mod session;
pub mod mcp;
pub mod tools;
pub mod orchestrator;

// Re-export commonly used types
pub use types::{
    CancellationToken, Conversation, ConversationMessage, MessageRole, ModelToolSpec, ToolCallRequest,
    ToolCallResult, ToolCatalog, ToolChoice, ToolDescriptor,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{ConfigError, ConfigFile, ConfigLevel, FileConfigProvider, ModelSettings, OrchestratorSettings};

pub use providers::{create_provider, AssistantReply, ChatRequest, MockProvider, OpenAiProvider, Provider, ProviderError};

pub use session::{JsonObject, MockToolSession, SessionError, SessionResult, ToolSession};

pub use mcp::{McpSession, ServerEndpoint, DEFAULT_SERVER_URL};

pub use tools::{to_model_specs, ToolArguments};

pub use orchestrator::{
    run_scoped, with_context, OrchestratorContext, OrchestratorError, OrchestratorResult, Pass, QueryState,
};
