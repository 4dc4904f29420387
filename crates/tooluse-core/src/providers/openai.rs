//! OpenAI-compatible chat completions provider
//!
//! Speaks `POST {api_base}/chat/completions` with function tools and an
//! explicit `tool_choice`. Works against OpenAI itself and any server that
//! mirrors its API (Ollama, vLLM, LM Studio, ...).

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::types::{ConversationMessage, ModelToolSpec, ToolCallRequest};
use crate::{log_debug, log_info};

use super::error::{ProviderError, ProviderResult};
use super::traits::{AssistantReply, ChatRequest, Provider};

/// Default API base for the hosted OpenAI service
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Chat provider for OpenAI-compatible endpoints
pub struct OpenAiProvider {
    provider_name: String,
    api_base: String,
    api_key: Option<String>,
    /// Dropped on close to release pooled connections
    client: RwLock<Option<reqwest::Client>>,
    logger: Arc<dyn Logger>,
}

impl OpenAiProvider {
    /// Create a provider from explicit parts
    pub fn new(
        provider_name: impl Into<String>,
        api_base: impl Into<String>,
        api_key: Option<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            api_base: api_base.into(),
            api_key,
            client: RwLock::new(Some(reqwest::Client::new())),
            logger,
        }
    }

    /// Create a provider from config, reading the key from the environment
    ///
    /// The hosted OpenAI endpoint requires a key; custom bases (local
    /// servers) may run without one.
    pub fn from_settings(settings: &ModelSettings, logger: Arc<dyn Logger>) -> ProviderResult<Self> {
        let api_base = settings.api_base.clone().unwrap_or_else(|| OPENAI_API_BASE.to_string());
        let api_key = settings.api_key();

        if api_key.is_none() && settings.api_base.is_none() {
            return Err(ProviderError::missing_api_key(&settings.provider, &settings.api_key_env));
        }

        Ok(Self::new(settings.provider.clone(), api_base, api_key, logger))
    }

    /// The chat completions URL
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn chat(&self, request: ChatRequest) -> ProviderResult<AssistantReply> {
        let client = self
            .client
            .read()
            .clone()
            .ok_or_else(|| ProviderError::closed(&self.provider_name))?;

        log_info!(
            self.logger,
            "[OpenAiProvider] chat: model={}, messages={}, tools={}, tool_choice={}",
            request.model,
            request.messages.len(),
            request.tools.len(),
            request.tool_choice.as_str()
        );

        let body = WireRequest::from_request(&request);
        let mut http = client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await?;
        let status = response.status();
        let text = response.text().await?;

        log_debug!(self.logger, "[OpenAiProvider] response status={}", status);

        if !status.is_success() {
            return Err(ProviderError::api_error(&self.provider_name, status.as_u16(), text));
        }

        let parsed: WireResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::invalid_response(&self.provider_name, format!("parse failed: {e}"))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| {
                ProviderError::invalid_response(&self.provider_name, "missing choices[0].message")
            })?;

        message.into_reply(&self.provider_name)
    }

    async fn close(&self) -> ProviderResult<()> {
        if self.client.write().take().is_some() {
            log_debug!(self.logger, "[OpenAiProvider] client closed");
        }
        Ok(())
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    // Both are omitted together: the API rejects `tool_choice` without tools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

impl WireRequest {
    fn from_request(request: &ChatRequest) -> Self {
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from).collect();
        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some(request.tool_choice.as_str())
        };

        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools,
            tool_choice,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

impl From<&ModelToolSpec> for WireTool {
    fn from(spec: &ModelToolSpec) -> Self {
        Self {
            kind: spec.kind.clone(),
            function: WireFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ConversationMessage> for WireMessage {
    fn from(msg: &ConversationMessage) -> Self {
        let role = match msg.role {
            crate::types::MessageRole::User => "user",
            crate::types::MessageRole::Assistant => "assistant",
            crate::types::MessageRole::Tool => "tool",
        };

        Self {
            role,
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .as_ref()
                .map(|calls| calls.iter().map(WireToolCall::from).collect()),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    ModelToolSpec::FUNCTION.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<&ToolCallRequest> for WireToolCall {
    fn from(call: &ToolCallRequest) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.tool_name.clone(),
                arguments: call.arguments_json.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireResponseMessage {
    fn into_reply(self, provider: &str) -> ProviderResult<AssistantReply> {
        let mut tool_calls = Vec::new();
        for call in self.tool_calls.unwrap_or_default() {
            if call.kind != ModelToolSpec::FUNCTION {
                continue;
            }
            if call.id.is_empty() || call.function.name.is_empty() {
                return Err(ProviderError::invalid_response(
                    provider,
                    "tool call without id or function name",
                ));
            }
            tool_calls.push(ToolCallRequest::new(call.id, call.function.name, call.function.arguments));
        }

        Ok(AssistantReply {
            content: self.content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolChoice;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn add_spec() -> ModelToolSpec {
        ModelToolSpec::function(
            "add",
            "Add two numbers",
            json!({"type": "object", "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}}}),
        )
    }

    #[test]
    fn test_request_wire_format() {
        let messages = vec![
            ConversationMessage::user("what is 2+3?"),
            ConversationMessage::assistant(None, vec![ToolCallRequest::new("call_1", "add", r#"{"a":2,"b":3}"#)]),
            ConversationMessage::tool("call_1", "5"),
        ];
        let request = ChatRequest::new("gpt-4o", messages)
            .with_tools(vec![add_spec()])
            .with_tool_choice(ToolChoice::None);

        let value = serde_json::to_value(WireRequest::from_request(&request)).unwrap();

        assert_eq!(value["tool_choice"], "none");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "add");
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert!(value["messages"][1]["content"].is_null());
        assert_eq!(value["messages"][1]["tool_calls"][0]["function"]["arguments"], r#"{"a":2,"b":3}"#);
        assert_eq!(value["messages"][2]["role"], "tool");
        assert_eq!(value["messages"][2]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_request_without_tools_omits_choice() {
        let request = ChatRequest::new("gpt-4o", vec![ConversationMessage::user("hi")]);
        let value = serde_json::to_value(WireRequest::from_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_response_with_tool_calls() {
        let message: WireResponseMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {"id": "call_1", "type": "function", "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}},
                {"id": "call_2", "type": "function", "function": {"name": "add", "arguments": "{\"a\":1,\"b\":1}"}}
            ]
        }))
        .unwrap();

        let reply = message.into_reply("openai").unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].id, "call_1");
        assert_eq!(reply.tool_calls[1].id, "call_2");
        assert_eq!(reply.tool_calls[0].arguments_json, r#"{"a":2,"b":3}"#);
    }

    #[test]
    fn test_response_tool_call_without_name_is_invalid() {
        let message: WireResponseMessage = serde_json::from_value(json!({
            "tool_calls": [{"id": "call_1", "function": {"name": ""}}]
        }))
        .unwrap();
        assert!(matches!(
            message.into_reply("openai"),
            Err(ProviderError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_missing_key_for_hosted_endpoint() {
        let settings = ModelSettings {
            api_key_env: "TOOLUSE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let result = OpenAiProvider::from_settings(&settings, test_logger());
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));

        let local = ModelSettings {
            api_base: Some("http://localhost:11434/v1/".to_string()),
            ..settings
        };
        let provider = OpenAiProvider::from_settings(&local, test_logger()).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_contains("\"tool_choice\":\"auto\"");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "2 + 3 = 5"}}]
                }));
            })
            .await;

        let provider = OpenAiProvider::new(
            "openai",
            server.url("/v1"),
            Some("sk-test".to_string()),
            test_logger(),
        );
        let request = ChatRequest::new("gpt-4o", vec![ConversationMessage::user("what is 2+3?")])
            .with_tools(vec![add_spec()]);

        let reply = provider.chat(request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(reply.content.as_deref(), Some("2 + 3 = 5"));
        assert!(!reply.has_tool_calls());
    }

    #[tokio::test]
    async fn test_chat_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let provider = OpenAiProvider::new("openai", server.base_url(), None, test_logger());
        let err = provider
            .chat(ChatRequest::new("gpt-4o", vec![ConversationMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_requests() {
        let provider = OpenAiProvider::new("openai", "http://127.0.0.1:9", None, test_logger());
        provider.close().await.unwrap();
        provider.close().await.unwrap();
        assert!(provider.is_closed());

        let err = provider
            .chat(ChatRequest::new("gpt-4o", vec![ConversationMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Closed { .. }));
    }
}
