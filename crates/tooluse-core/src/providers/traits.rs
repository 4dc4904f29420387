//! Provider trait definition

use async_trait::async_trait;

use crate::types::{ConversationMessage, ModelToolSpec, ToolCallRequest, ToolChoice};
use super::error::ProviderResult;

/// One chat-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// Full conversation so far, in order
    pub messages: Vec<ConversationMessage>,
    /// Tools the model may call
    pub tools: Vec<ModelToolSpec>,
    /// Whether the model may call them
    pub tool_choice: ToolChoice,
}

impl ChatRequest {
    /// Create a request with no tools and `auto` tool choice
    pub fn new(model: impl Into<String>, messages: Vec<ConversationMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
        }
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<ModelToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }
}

/// The assistant message a model returned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantReply {
    /// Text content, `None` when the model only requested tools
    pub content: Option<String>,
    /// Requested tool calls, in emission order
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantReply {
    /// A plain text reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply that only requests tools
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Provider trait for chat model implementations
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Submit one chat completion and wait for the assistant message
    async fn chat(&self, request: ChatRequest) -> ProviderResult<AssistantReply>;

    /// Release the client's connections. Calling it twice is not an error;
    /// requests after close fail with [`ProviderError::Closed`].
    ///
    /// [`ProviderError::Closed`]: super::ProviderError::Closed
    async fn close(&self) -> ProviderResult<()>;
}
