//! Scoped acquisition of orchestrator resources

use futures::future::BoxFuture;

use super::context::OrchestratorContext;
use super::error::OrchestratorResult;
use crate::log_error;
use crate::mcp::ServerEndpoint;

/// Connect, run `body`, and always clean up
///
/// Teardown runs on every exit path: a failed connect, a failed body or a
/// successful one. When the body fails its error wins and any cleanup
/// failure is logged; otherwise a cleanup failure is returned.
///
/// ```rust,ignore
/// let answer = run_scoped(context, &endpoint, |ctx| {
///     Box::pin(async move { ctx.process_query("what is 2+3?").await })
/// })
/// .await?;
/// ```
pub async fn run_scoped<T, F>(context: OrchestratorContext, endpoint: &ServerEndpoint, body: F) -> OrchestratorResult<T>
where
    F: for<'a> FnOnce(&'a mut OrchestratorContext) -> BoxFuture<'a, OrchestratorResult<T>>,
{
    let mut context = context;
    let outcome = match context.connect(endpoint).await {
        Ok(()) => body(&mut context).await,
        Err(e) => Err(e),
    };
    finish(context, outcome).await
}

/// Like [`run_scoped`] for a context that is already connected
pub async fn with_context<T, F>(context: OrchestratorContext, body: F) -> OrchestratorResult<T>
where
    F: for<'a> FnOnce(&'a mut OrchestratorContext) -> BoxFuture<'a, OrchestratorResult<T>>,
{
    let mut context = context;
    let outcome = body(&mut context).await;
    finish(context, outcome).await
}

async fn finish<T>(mut context: OrchestratorContext, outcome: OrchestratorResult<T>) -> OrchestratorResult<T> {
    let cleanup = context.cleanup().await;
    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            log_error!(context.logger(), "[Lifecycle] Cleanup after failure also failed: {}", cleanup_err);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::OrchestratorSettings;
    use crate::logging::{Logger, NoOpLogger};
    use crate::orchestrator::OrchestratorError;
    use crate::providers::{AssistantReply, MockProvider};
    use crate::session::MockToolSession;
    use crate::types::{ToolCallRequest, ToolDescriptor};

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    fn context(provider: Arc<MockProvider>) -> OrchestratorContext {
        OrchestratorContext::new(provider, "mock-model", OrchestratorSettings::default(), logger())
    }

    /// Keeps error lines only
    #[derive(Default)]
    struct ErrorLines(parking_lot::Mutex<Vec<String>>);

    impl Logger for ErrorLines {
        fn debug(&self, _message: &str) {}
        fn info(&self, _message: &str) {}
        fn warn(&self, _message: &str) {}
        fn error(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn test_connection_error_still_releases_model_client() {
        let provider = Arc::new(MockProvider::echo(logger()));
        let endpoint = ServerEndpoint::stdio("/nonexistent/tooluse-test-server", vec![]);

        let err = run_scoped(context(provider.clone()), &endpoint, |ctx| {
            Box::pin(async move { ctx.process_query("unreachable").await })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, OrchestratorError::Connection(_)));
        assert_eq!(provider.close_count(), 1);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_body_failure_still_releases_everything() {
        let provider = Arc::new(MockProvider::error("model offline", logger()));
        let session = MockToolSession::new(vec![ToolDescriptor::new("add", "Add")]);
        let mut ctx = context(provider.clone());
        ctx.connect_with(Box::new(session.clone())).await.unwrap();

        let err = with_context(ctx, |ctx| Box::pin(async move { ctx.process_query("q").await }))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::ModelRequest { .. }));
        assert_eq!(session.close_count(), 1);
        assert_eq!(provider.close_count(), 1);
    }

    #[tokio::test]
    async fn test_body_error_wins_over_cleanup_error() {
        let provider = Arc::new(MockProvider::error("model offline", logger()));
        let session = MockToolSession::new(Vec::new()).failing_close("socket gone");
        let errors = Arc::new(ErrorLines::default());
        let mut ctx = OrchestratorContext::new(
            provider.clone(),
            "mock-model",
            OrchestratorSettings::default(),
            errors.clone(),
        );
        ctx.connect_with(Box::new(session.clone())).await.unwrap();

        let err = with_context(ctx, |ctx| Box::pin(async move { ctx.process_query("q").await }))
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::ModelRequest { .. }));
        assert_eq!(provider.close_count(), 1);

        let lines = errors.0.lock();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("socket gone"));
    }

    #[tokio::test]
    async fn test_success_returns_answer_after_cleanup() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                AssistantReply::tool_calls(vec![ToolCallRequest::new("c1", "echo", r#"{"text":"hi"}"#)]),
                AssistantReply::text("said hi"),
            ],
            logger(),
        ));
        let session = MockToolSession::new(vec![ToolDescriptor::new("echo", "Echo")]).with_response("echo", "hi");
        let mut ctx = context(provider.clone());
        ctx.connect_with(Box::new(session.clone())).await.unwrap();

        let answer = with_context(ctx, |ctx| Box::pin(async move { ctx.process_query("say hi").await }))
            .await
            .unwrap();

        assert_eq!(answer, "said hi");
        assert_eq!(session.close_count(), 1);
        assert_eq!(provider.close_count(), 1);
    }
}
