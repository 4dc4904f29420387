//! In-memory tool session for testing
//!
//! Holds a catalog and per-tool handlers, records every invocation and
//! counts `close` calls. Clones share state, so a test can keep a handle
//! after giving the session to an orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{JsonObject, SessionError, SessionResult, ToolSession};
use crate::types::{ToolCatalog, ToolDescriptor};

/// Handler invoked for a tool call
pub type ToolHandler = Arc<dyn Fn(&JsonObject) -> SessionResult<String> + Send + Sync>;

#[derive(Default)]
struct MockState {
    catalog: ToolCatalog,
    handlers: HashMap<String, ToolHandler>,
    delays: HashMap<String, Duration>,
    invocations: Vec<(String, JsonObject)>,
    completions: Vec<String>,
    list_calls: usize,
    close_calls: usize,
    list_error: Option<String>,
    close_error: Option<String>,
}

/// Mock tool session
#[derive(Clone, Default)]
pub struct MockToolSession {
    state: Arc<Mutex<MockState>>,
}

impl MockToolSession {
    /// Create a session exposing `catalog`
    pub fn new(catalog: ToolCatalog) -> Self {
        let session = Self::default();
        session.state.lock().catalog = catalog;
        session
    }

    /// Answer calls to `name` with `handler`
    pub fn with_handler<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&JsonObject) -> SessionResult<String> + Send + Sync + 'static,
    {
        self.state.lock().handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Answer calls to `name` with fixed text
    pub fn with_response(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_handler(name, move |_| Ok(text.clone()))
    }

    /// Delay calls to `name`, to exercise out-of-order completion
    pub fn with_delay(self, name: impl Into<String>, delay: Duration) -> Self {
        self.state.lock().delays.insert(name.into(), delay);
        self
    }

    /// Make `list_tools` fail
    pub fn failing_discovery(self, message: impl Into<String>) -> Self {
        self.state.lock().list_error = Some(message.into());
        self
    }

    /// Make `close` fail (the session still counts as closed)
    pub fn failing_close(self, message: impl Into<String>) -> Self {
        self.state.lock().close_error = Some(message.into());
        self
    }

    /// Replace the exposed catalog
    pub fn set_catalog(&self, catalog: ToolCatalog) {
        self.state.lock().catalog = catalog;
    }

    /// Invocations in the order they were issued
    pub fn invocations(&self) -> Vec<(String, JsonObject)> {
        self.state.lock().invocations.clone()
    }

    /// Tool names in the order their invocations completed
    pub fn completions(&self) -> Vec<String> {
        self.state.lock().completions.clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.state.lock().invocations.len()
    }

    pub fn list_count(&self) -> usize {
        self.state.lock().list_calls
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }

    fn find(&self, name: &str) -> Option<ToolDescriptor> {
        self.state.lock().catalog.iter().find(|t| t.name == name).cloned()
    }
}

#[async_trait]
impl ToolSession for MockToolSession {
    fn endpoint(&self) -> String {
        "mock://tools".to_string()
    }

    fn session_id(&self) -> Option<String> {
        Some("mock-session".to_string())
    }

    async fn list_tools(&self) -> SessionResult<ToolCatalog> {
        let mut state = self.state.lock();
        if state.close_calls > 0 {
            return Err(SessionError::Closed);
        }
        state.list_calls += 1;
        if let Some(message) = &state.list_error {
            return Err(SessionError::Discovery(message.clone()));
        }
        Ok(state.catalog.clone())
    }

    async fn invoke(&self, tool_name: &str, arguments: JsonObject) -> SessionResult<String> {
        let (handler, delay) = {
            let mut state = self.state.lock();
            if state.close_calls > 0 {
                return Err(SessionError::Closed);
            }
            state.invocations.push((tool_name.to_string(), arguments.clone()));
            (
                state.handlers.get(tool_name).cloned(),
                state.delays.get(tool_name).copied(),
            )
        };

        if self.find(tool_name).is_none() {
            return Err(SessionError::tool_not_found(tool_name));
        }

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = match handler {
            Some(handler) => handler(&arguments),
            None => Ok(String::new()),
        };

        self.state.lock().completions.push(tool_name.to_string());
        result
    }

    async fn close(&self) -> SessionResult<()> {
        let mut state = self.state.lock();
        state.close_calls += 1;
        match (&state.close_error, state.close_calls) {
            (Some(message), 1) => Err(SessionError::Close(message.clone())),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> JsonObject {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_invoke_records_and_answers() {
        let session = MockToolSession::new(vec![ToolDescriptor::new("add", "Add")]).with_handler("add", |a| {
            let sum = a["a"].as_i64().unwrap_or(0) + a["b"].as_i64().unwrap_or(0);
            Ok(sum.to_string())
        });

        let text = session.invoke("add", args(json!({"a": 2, "b": 3}))).await.unwrap();
        assert_eq!(text, "5");
        assert_eq!(session.invocation_count(), 1);
        assert_eq!(session.completions(), vec!["add".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let session = MockToolSession::new(vec![]);
        let err = session.invoke("nope", JsonObject::new()).await.unwrap_err();
        assert_eq!(err, SessionError::tool_not_found("nope"));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = MockToolSession::new(vec![]).failing_close("socket gone");
        assert!(session.close().await.is_err());
        assert!(session.close().await.is_ok());
        assert_eq!(session.close_count(), 2);
        assert_eq!(session.list_tools().await.unwrap_err(), SessionError::Closed);
    }

    #[tokio::test]
    async fn test_failing_discovery() {
        let session = MockToolSession::new(vec![]).failing_discovery("server down");
        assert!(matches!(session.list_tools().await, Err(SessionError::Discovery(_))));
        assert_eq!(session.list_count(), 1);
    }
}
