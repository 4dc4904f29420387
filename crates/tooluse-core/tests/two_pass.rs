use std::sync::Arc;

use serde_json::json;
use tooluse_core::{
    with_context, AssistantReply, ConfigFile, Logger, MessageRole, MockProvider, MockToolSession, NoOpLogger,
    OrchestratorContext, OrchestratorError, OrchestratorSettings, ToolCallRequest, ToolChoice, ToolDescriptor,
};

fn logger() -> Arc<dyn Logger> {
    Arc::new(NoOpLogger)
}

fn calculator() -> MockToolSession {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
        "required": ["a", "b"]
    });
    MockToolSession::new(vec![
        ToolDescriptor::new("add", "Add two integers").with_schema(schema.clone()),
        ToolDescriptor::new("mul", "Multiply two integers").with_schema(schema),
    ])
    .with_handler("add", |args| {
        Ok((args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0)).to_string())
    })
    .with_handler("mul", |args| {
        Ok((args["a"].as_i64().unwrap_or(0) * args["b"].as_i64().unwrap_or(0)).to_string())
    })
}

#[tokio::test]
async fn answers_with_tool_results() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            AssistantReply::tool_calls(vec![
                ToolCallRequest::new("call_add", "add", r#"{"a": 2, "b": 3}"#),
                ToolCallRequest::new("call_mul", "mul", r#"{"a": 4, "b": 5}"#),
            ]),
            AssistantReply::text("2 + 3 = 5 and 4 * 5 = 20"),
        ],
        logger(),
    ));
    let session = calculator();

    let mut context = OrchestratorContext::new(provider.clone(), "gpt-4o", OrchestratorSettings::default(), logger());
    context.connect_with(Box::new(session.clone())).await.unwrap();

    let answer = with_context(context, |ctx| {
        Box::pin(async move { ctx.process_query("what are 2+3 and 4*5?").await })
    })
    .await
    .unwrap();

    assert_eq!(answer, "2 + 3 = 5 and 4 * 5 = 20");
    assert_eq!(session.invocation_count(), 2);
    assert_eq!(session.close_count(), 1);
    assert_eq!(provider.close_count(), 1);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["add", "mul"]);
    assert_eq!(requests[1].tool_choice, ToolChoice::None);

    let follow_up = &requests[1].messages;
    assert_eq!(follow_up[1].requested_tool_calls().len(), 2);
    let results: Vec<_> = follow_up
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .map(|m| (m.tool_call_id.as_deref().unwrap_or_default(), m.text()))
        .collect();
    assert_eq!(results, vec![("call_add", "5"), ("call_mul", "20")]);
}

#[tokio::test]
async fn empty_catalog_answers_directly() {
    let provider = Arc::new(MockProvider::fixed("Rust was first released in 2015.", logger()));
    let session = MockToolSession::new(Vec::new());

    let mut context = OrchestratorContext::new(provider.clone(), "gpt-4o", OrchestratorSettings::default(), logger());
    context.connect_with(Box::new(session.clone())).await.unwrap();

    let answer = with_context(context, |ctx| {
        Box::pin(async move { ctx.process_query("When was Rust 1.0 released?").await })
    })
    .await
    .unwrap();

    assert_eq!(answer, "Rust was first released in 2015.");
    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.requests()[0].tool_choice, ToolChoice::Auto);
    assert_eq!(session.invocation_count(), 0);
}

#[tokio::test]
async fn context_from_mock_config() {
    let config = ConfigFile::from_yaml_str(
        r#"
model:
  provider: mock
  model: offline
server:
  transport: stdio
  command: /nonexistent/tooluse-test-server
orchestrator:
  parallel_tool_calls: false
"#,
    )
    .unwrap();

    let mut context = OrchestratorContext::from_config(&config, logger()).unwrap();
    assert_eq!(context.model(), "offline");
    assert!(!context.settings().parallel_tool_calls);

    let err = context.connect(&config.server).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Connection(_)));
    assert_eq!(err.stage(), "connect");

    context.cleanup().await.unwrap();
    context.cleanup().await.unwrap();
    assert!(context.is_released());
}
