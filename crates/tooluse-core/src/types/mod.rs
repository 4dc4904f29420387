//! Core types for tool-augmented queries
//!
//! This module contains the data model shared by the session, the tool
//! adapter, the providers and the orchestrator.

mod message;
mod tool;
mod cancellation;

pub use message::{Conversation, ConversationMessage, MessageRole};
pub use tool::{ModelToolSpec, ToolCallRequest, ToolCallResult, ToolCatalog, ToolChoice, ToolDescriptor};
pub use cancellation::CancellationToken;
