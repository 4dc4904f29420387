//! Orchestrator context and the two-pass query protocol

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::error::{OrchestratorError, OrchestratorResult, Pass};
use crate::config::{ConfigFile, OrchestratorSettings};
use crate::logging::Logger;
use crate::mcp::{McpSession, ServerEndpoint};
use crate::providers::{create_provider, ChatRequest, Provider, ProviderError};
use crate::session::{SessionError, SessionResult, ToolSession};
use crate::tools::{find_tool, to_model_specs, validate_catalog, ToolArguments};
use crate::types::{
    CancellationToken, Conversation, ConversationMessage, ModelToolSpec, ToolCallRequest, ToolCallResult,
    ToolCatalog, ToolChoice,
};
use crate::{log_debug, log_error, log_info, log_warn};

/// Position in the two-pass protocol, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    AwaitingFirstResponse,
    NoToolCalls,
    HasToolCalls,
    ExecutingTools,
    AwaitingFinalResponse,
    Done,
}

/// Everything one caller needs to run queries: the tool session, the
/// model client and the settings that shape a query
///
/// Owned by the caller and passed explicitly; there is no process-wide
/// state. Resources are acquired in order (model client object, then the
/// session via [`connect`](Self::connect); the model client only opens a
/// network connection on its first request) and released by
/// [`cleanup`](Self::cleanup), session first.
pub struct OrchestratorContext {
    session: Option<Box<dyn ToolSession>>,
    provider: Option<Arc<dyn Provider>>,
    model: String,
    settings: OrchestratorSettings,
    logger: Arc<dyn Logger>,
}

impl OrchestratorContext {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        settings: OrchestratorSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            session: None,
            provider: Some(provider),
            model: model.into(),
            settings,
            logger,
        }
    }

    /// Build a context from a loaded configuration file
    pub fn from_config(config: &ConfigFile, logger: Arc<dyn Logger>) -> OrchestratorResult<Self> {
        let provider = create_provider(&config.model, logger.clone()).map_err(OrchestratorError::ModelClient)?;
        Ok(Self::new(
            provider,
            config.model.model.clone(),
            config.orchestrator.clone(),
            logger,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// The live session, if connected
    pub fn session(&self) -> Option<&dyn ToolSession> {
        self.session.as_deref()
    }

    /// Open an MCP session to `endpoint`
    pub async fn connect(&mut self, endpoint: &ServerEndpoint) -> OrchestratorResult<()> {
        let session = McpSession::open(endpoint, self.logger.clone())
            .await
            .map_err(OrchestratorError::Connection)?;
        self.connect_with(Box::new(session)).await
    }

    /// Adopt an already-open session
    ///
    /// Replaces (and closes) any previous session, then lists the catalog
    /// once for diagnostics. A discovery failure here closes the new
    /// session and is reported.
    pub async fn connect_with(&mut self, session: Box<dyn ToolSession>) -> OrchestratorResult<()> {
        if let Some(previous) = self.session.take() {
            log_info!(self.logger, "[Orchestrator] Replacing session {}", previous.endpoint());
            if let Err(e) = previous.close().await {
                log_warn!(self.logger, "[Orchestrator] Failed to close previous session: {}", e);
            }
        }

        match session.session_id() {
            Some(id) => log_info!(self.logger, "[Orchestrator] Session ID: {}", id),
            None => log_debug!(self.logger, "[Orchestrator] Session ID unavailable for {}", session.endpoint()),
        }

        let catalog = match session.list_tools().await.and_then(|c| validate_catalog(&c).map(|_| c)) {
            Ok(catalog) => catalog,
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    log_warn!(self.logger, "[Orchestrator] Failed to close session: {}", close_err);
                }
                return Err(OrchestratorError::discovery(e));
            }
        };

        log_info!(
            self.logger,
            "[Orchestrator] Connected to {} with {} tools",
            session.endpoint(),
            catalog.len()
        );
        for tool in &catalog {
            log_info!(self.logger, "[Orchestrator]   {}: {}", tool.name, tool.description);
        }

        self.session = Some(session);
        Ok(())
    }

    /// Run one query through the two-pass protocol and return the answer
    pub async fn process_query(&mut self, query: &str) -> OrchestratorResult<String> {
        self.process_query_with_cancel(query, &CancellationToken::new()).await
    }

    /// [`process_query`](Self::process_query) with external cancellation
    ///
    /// On cancellation or timeout, in-flight tool invocations are abandoned,
    /// their partial results discarded and the session closed.
    pub async fn process_query_with_cancel(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<String> {
        let timeout = self.settings.query_timeout();
        let result = guarded(self.run_two_pass(query), timeout, cancel).await;

        if let Err(e @ (OrchestratorError::Cancelled | OrchestratorError::Timeout(_))) = &result {
            log_warn!(self.logger, "[Orchestrator] {}; closing session", e);
            if let Some(session) = self.session.take() {
                if let Err(close_err) = session.close().await {
                    log_warn!(self.logger, "[Orchestrator] Failed to close session: {}", close_err);
                }
            }
        }

        result
    }

    async fn run_two_pass(&self, query: &str) -> OrchestratorResult<String> {
        let session = self.session.as_deref().ok_or(OrchestratorError::NotConnected)?;
        let provider = self.provider.as_ref().ok_or(OrchestratorError::Released)?;

        self.trace(QueryState::Idle);
        let catalog = session.list_tools().await.map_err(OrchestratorError::discovery)?;
        validate_catalog(&catalog).map_err(OrchestratorError::discovery)?;
        let specs = to_model_specs(&catalog);

        let mut conversation = Conversation::from_query(query);

        self.trace(QueryState::AwaitingFirstResponse);
        let first = provider
            .chat(self.request(&conversation, &specs, ToolChoice::Auto))
            .await
            .map_err(|e| OrchestratorError::model_request(Pass::First, e))?;
        conversation.push(ConversationMessage::assistant(first.content.clone(), first.tool_calls.clone()));

        if !first.has_tool_calls() {
            self.trace(QueryState::NoToolCalls);
            self.trace(QueryState::Done);
            return Ok(first.content.unwrap_or_default());
        }

        self.trace(QueryState::HasToolCalls);
        log_info!(
            self.logger,
            "[Orchestrator] Model requested {} tool call(s)",
            first.tool_calls.len()
        );

        self.trace(QueryState::ExecutingTools);
        for result in self.execute_tool_calls(session, &catalog, &first.tool_calls).await? {
            conversation.push(result.into());
        }

        self.trace(QueryState::AwaitingFinalResponse);
        let last = provider
            .chat(self.request(&conversation, &specs, ToolChoice::None))
            .await
            .map_err(|e| OrchestratorError::model_request(Pass::Final, e))?;
        if last.has_tool_calls() {
            if last.content.is_none() {
                return Err(OrchestratorError::model_request(
                    Pass::Final,
                    ProviderError::invalid_response(
                        provider.name(),
                        "final pass requested tools instead of answering",
                    ),
                ));
            }
            log_warn!(
                self.logger,
                "[Orchestrator] Ignoring {} tool call(s) requested in the final pass",
                last.tool_calls.len()
            );
        }

        self.trace(QueryState::Done);
        Ok(last.content.unwrap_or_default())
    }

    fn request(&self, conversation: &Conversation, specs: &[ModelToolSpec], choice: ToolChoice) -> ChatRequest {
        ChatRequest::new(self.model.clone(), conversation.messages().to_vec())
            .with_tools(specs.to_vec())
            .with_tool_choice(choice)
    }

    /// Execute every requested call; results come back in request order
    async fn execute_tool_calls(
        &self,
        session: &dyn ToolSession,
        catalog: &ToolCatalog,
        calls: &[ToolCallRequest],
    ) -> OrchestratorResult<Vec<ToolCallResult>> {
        let invocations = calls.iter().map(|call| self.execute_tool_call(session, catalog, call));

        let outcomes = if self.settings.parallel_tool_calls {
            join_all(invocations).await
        } else {
            let mut outcomes = Vec::with_capacity(calls.len());
            for invocation in invocations {
                outcomes.push(invocation.await);
            }
            outcomes
        };

        outcomes
            .into_iter()
            .collect::<SessionResult<Vec<_>>>()
            .map_err(OrchestratorError::ToolExecution)
    }

    /// Execute one call; invocation-scoped failures become error text
    async fn execute_tool_call(
        &self,
        session: &dyn ToolSession,
        catalog: &ToolCatalog,
        call: &ToolCallRequest,
    ) -> SessionResult<ToolCallResult> {
        log_debug!(
            self.logger,
            "[Orchestrator] Calling {} ({}) with {}",
            call.tool_name,
            call.id,
            call.arguments_json
        );

        let outcome: SessionResult<String> = async {
            let tool = find_tool(catalog, &call.tool_name).ok_or_else(|| SessionError::tool_not_found(&call.tool_name))?;
            let arguments = ToolArguments::parse(&call.arguments_json, tool)?;
            session.invoke(&call.tool_name, arguments.into_map()).await
        }
        .await;

        match outcome {
            Ok(text) => Ok(ToolCallResult::new(&call.id, text)),
            Err(e) if e.is_invocation_error() => {
                log_warn!(self.logger, "[Orchestrator] Tool call {} failed: {}", call.id, e);
                Ok(ToolCallResult::new(&call.id, format!("Error: {}", e)))
            }
            Err(e) => Err(e),
        }
    }

    /// Release the session, then the model client
    ///
    /// Every owned resource is released even if an earlier release fails;
    /// the first failure is reported and the rest are logged. Calling it
    /// again, or without ever connecting, is a no-op.
    pub async fn cleanup(&mut self) -> OrchestratorResult<()> {
        let mut failures = Vec::new();

        if let Some(session) = self.session.take() {
            log_debug!(self.logger, "[Orchestrator] Closing session {}", session.endpoint());
            if let Err(e) = session.close().await {
                failures.push(format!("session: {}", e));
            }
        }

        if let Some(provider) = self.provider.take() {
            log_debug!(self.logger, "[Orchestrator] Closing model client {}", provider.name());
            if let Err(e) = provider.close().await {
                failures.push(format!("model client: {}", e));
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        for failure in failures.iter().skip(1) {
            log_error!(self.logger, "[Orchestrator] Additional cleanup failure: {}", failure);
        }
        Err(OrchestratorError::cleanup(&failures))
    }

    /// Whether both resources have been released
    pub fn is_released(&self) -> bool {
        self.session.is_none() && self.provider.is_none()
    }

    fn trace(&self, state: QueryState) {
        log_debug!(self.logger, "[Orchestrator] state: {:?}", state);
    }
}

impl Drop for OrchestratorContext {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            log_warn!(
                self.logger,
                "[Orchestrator] Dropped without cleanup; session {} left open",
                session.endpoint()
            );
        }
    }
}

impl std::fmt::Debug for OrchestratorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorContext")
            .field("model", &self.model)
            .field("connected", &self.is_connected())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Race a query against its timeout and the cancellation token
async fn guarded<F>(query: F, timeout: Option<Duration>, cancel: &CancellationToken) -> OrchestratorResult<String>
where
    F: Future<Output = OrchestratorResult<String>>,
{
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, query)
                .await
                .unwrap_or(Err(OrchestratorError::Timeout(limit))),
            None => query.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
        result = bounded => result,
    }
}
