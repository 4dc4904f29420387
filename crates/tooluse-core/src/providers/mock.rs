//! Mock provider for testing
//!
//! Deterministic, configurable replies without network dependencies. Every
//! request is recorded so tests can assert on what the orchestrator sent.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{AssistantReply, ChatRequest, Provider};
use crate::log_debug;
use crate::logging::Logger;
use crate::types::MessageRole;

/// Mock response mode
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Echo back the last user message
    Echo,
    /// Return the same text reply every time
    Fixed(String),
    /// Return queued replies in order; an exhausted queue is an error
    Scripted(VecDeque<Result<AssistantReply, String>>),
    /// Fail every request
    Error(String),
}

impl Default for MockMode {
    fn default() -> Self {
        MockMode::Echo
    }
}

/// Mock chat provider for testing
pub struct MockProvider {
    mode: Mutex<MockMode>,
    requests: Mutex<Vec<ChatRequest>>,
    close_calls: Mutex<usize>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create a provider with a specific mode
    pub fn with_mode(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: Mutex::new(mode),
            requests: Mutex::new(Vec::new()),
            close_calls: Mutex::new(0),
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider that answers with `replies` in order
    pub fn scripted(replies: Vec<AssistantReply>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Scripted(replies.into_iter().map(Ok).collect()), logger)
    }

    /// Create an error-producing provider
    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_mode(MockMode::Error(message.into()), logger)
    }

    /// Queue a failure after the already scripted replies
    pub fn push_error(&self, message: impl Into<String>) {
        if let MockMode::Scripted(queue) = &mut *self.mode.lock() {
            queue.push_back(Err(message.into()));
        }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        *self.close_calls.lock()
    }

    fn last_user_message(request: &ChatRequest) -> String {
        request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.text().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<AssistantReply> {
        log_debug!(
            self.logger,
            "MockProvider: chat called with {} messages, tool_choice={}",
            request.messages.len(),
            request.tool_choice.as_str()
        );

        let reply = match &mut *self.mode.lock() {
            MockMode::Echo => Ok(AssistantReply::text(format!("Echo: {}", Self::last_user_message(&request)))),
            MockMode::Fixed(response) => Ok(AssistantReply::text(response.clone())),
            MockMode::Scripted(queue) => match queue.pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(message)) => Err(ProviderError::Other(format!("Mock error: {}", message))),
                None => Err(ProviderError::Other("Mock error: script exhausted".to_string())),
            },
            MockMode::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        };

        self.requests.lock().push(request);
        reply
    }

    async fn close(&self) -> ProviderResult<()> {
        *self.close_calls.lock() += 1;
        Ok(())
    }
}
