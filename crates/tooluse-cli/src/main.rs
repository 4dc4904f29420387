//! tooluse: answer questions with a chat model and an MCP tool server.
//!
//! ```text
//! tooluse query "what is 2+3?"
//! tooluse tools --schema
//! tooluse call add --args '{"a": 2, "b": 3}'
//! ```

mod cli;

use std::sync::Arc;

use anyhow::{bail, Context};
use tooluse_core::session::ToolSession;
use tooluse_core::tools::{find_tool, ToolArguments};
use tooluse_core::{
    run_scoped, CancellationToken, ConfigFile, ConfigLevel, ConsoleLogger, FileConfigProvider, McpSession,
    OrchestratorContext, SharedLogger, TracingLogger,
};

use crate::cli::{Args, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = cli::parse();
    init_tracing(args.verbose);

    let mut config = load_config(&args)?;
    args.overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let logger = core_logger(args.plain, args.verbose);

    match args.command {
        Command::Query { text, timeout, sequential } => {
            if let Some(secs) = timeout {
                config.orchestrator.query_timeout_secs = Some(secs);
            }
            if sequential {
                config.orchestrator.parallel_tool_calls = false;
            }
            config.validate().context("invalid configuration")?;
            run_query(&config, &text, logger).await
        }
        Command::Tools { schema } => list_tools(&config, schema, logger).await,
        Command::Call { name, args } => call_tool(&config, &name, &args, logger).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tooluse=debug" } else { "tooluse=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()),
        )
        .init();
}

/// Logger handed to the core crate
fn core_logger(plain: bool, verbose: bool) -> SharedLogger {
    match (plain, verbose) {
        (true, true) => Arc::new(ConsoleLogger::new().verbose()),
        (true, false) => Arc::new(ConsoleLogger::new()),
        (false, _) => Arc::new(TracingLogger::new("cli")),
    }
}

fn load_config(args: &Args) -> anyhow::Result<ConfigFile> {
    let provider = match &args.config {
        Some(path) => FileConfigProvider::new(path, ConfigLevel::User),
        None => FileConfigProvider::user(),
    };
    tracing::debug!(path = %provider.path().display(), exists = provider.exists(), "loading config");
    provider
        .get_config()
        .with_context(|| format!("failed to load {}", provider.path().display()))
}

async fn run_query(config: &ConfigFile, text: &str, logger: SharedLogger) -> anyhow::Result<()> {
    let context = OrchestratorContext::from_config(config, logger)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling query");
            on_interrupt.cancel();
        }
    });

    let query = text.to_string();
    let answer = run_scoped(context, &config.server, move |ctx| {
        Box::pin(async move { ctx.process_query_with_cancel(&query, &cancel).await })
    })
    .await
    .map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("query failed at {}", stage))
    })?;

    println!("{}", answer);
    Ok(())
}

async fn list_tools(config: &ConfigFile, schema: bool, logger: SharedLogger) -> anyhow::Result<()> {
    let session = McpSession::open(&config.server, logger).await?;
    let listed = session.list_tools().await;
    close_session(&session, listed.is_ok()).await?;

    let catalog = listed?;
    if catalog.is_empty() {
        println!("No tools available at {}", config.server);
        return Ok(());
    }

    for tool in &catalog {
        println!("{}: {}", tool.name, tool.description);
        if schema {
            println!("{}", serde_json::to_string_pretty(&tool.input_schema)?);
        }
    }
    Ok(())
}

async fn call_tool(config: &ConfigFile, name: &str, arguments: &str, logger: SharedLogger) -> anyhow::Result<()> {
    let session = McpSession::open(&config.server, logger).await?;
    let outcome = invoke_once(&session, name, arguments).await;
    close_session(&session, outcome.is_ok()).await?;

    println!("{}", outcome?);
    Ok(())
}

/// Close the session; a close failure only fails the command when nothing else did
async fn close_session(session: &dyn ToolSession, succeeded: bool) -> anyhow::Result<()> {
    match session.close().await {
        Err(e) if succeeded => Err(e).context("failed to close session"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to close session");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

async fn invoke_once(session: &McpSession, name: &str, arguments: &str) -> anyhow::Result<String> {
    let catalog = session.list_tools().await?;
    let Some(tool) = find_tool(&catalog, name) else {
        let known: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        bail!("unknown tool {} (available: {})", name, known.join(", "));
    };
    let arguments = ToolArguments::parse(arguments, tool)?;
    Ok(session.invoke(name, arguments.into_map()).await?)
}
