//! MCP session using the official rmcp SDK
//!
//! Connects to MCP servers over streamable HTTP, a spawned child process
//! (stdio) or a Unix socket, and exposes them as a [`ToolSession`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rmcp::{
    model::{
        CallToolRequestParams, ClientCapabilities, ClientInfo, ClientRequest, CustomResult, ErrorCode, Implementation,
        ListToolsRequest, PaginatedRequestParams, RawContent, ServerResult,
    },
    service::{Peer, RunningService, ServiceError},
    RoleClient, ServiceExt,
};
use tokio::sync::Mutex;

use super::endpoint::ServerEndpoint;
use crate::logging::Logger;
use crate::session::{JsonObject, SessionError, SessionResult, ToolSession};
use crate::tools::{catalog_from_mcp, malformed_listing};
use crate::types::ToolCatalog;
use crate::{log_debug, log_info, log_warn};

/// A live MCP connection
pub struct McpSession {
    endpoint: ServerEndpoint,
    /// Request handle; stays valid until the service is cancelled
    peer: Peer<RoleClient>,
    /// Owning handle, taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    /// Names from the most recent `list_tools`, for the not-found check
    known_tools: RwLock<Option<Vec<String>>>,
    server_label: Option<String>,
    logger: Arc<dyn Logger>,
}

impl McpSession {
    /// Open a session and complete the initialize handshake
    pub async fn open(endpoint: &ServerEndpoint, logger: Arc<dyn Logger>) -> SessionResult<Self> {
        endpoint
            .validate()
            .map_err(|message| SessionError::connection(endpoint.to_string(), message))?;

        log_info!(logger, "[McpSession] Connecting via {}: {}", endpoint.transport(), endpoint);

        let service = match endpoint {
            ServerEndpoint::Http { url } => Self::connect_http(url).await,
            ServerEndpoint::Stdio { command, args, env } => Self::connect_stdio(command, args, env).await,
            ServerEndpoint::Unix { path } => Self::connect_unix(path).await,
        }
        .map_err(|message| SessionError::connection(endpoint.to_string(), message))?;

        let server_label = service
            .peer_info()
            .map(|info| format!("{} {}", info.server_info.name, info.server_info.version));
        match &server_label {
            Some(label) => log_info!(logger, "[McpSession] Connected to {}", label),
            None => log_info!(logger, "[McpSession] Connected (server did not report its identity)"),
        }

        let session = Self {
            endpoint: endpoint.clone(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            known_tools: RwLock::new(None),
            server_label,
            logger,
        };

        if session.session_id().is_none() {
            log_debug!(session.logger, "[McpSession] No session identifier exposed by transport");
        }

        Ok(session)
    }

    async fn connect_http(url: &str) -> Result<RunningService<RoleClient, ClientInfo>, String> {
        use rmcp::transport::StreamableHttpClientTransport;

        let transport = StreamableHttpClientTransport::from_uri(url);
        client_info()
            .serve(transport)
            .await
            .map_err(|e| format!("initialize streamable client: {}", e))
    }

    async fn connect_stdio(
        command: &str,
        args: &[String],
        env: &std::collections::BTreeMap<String, String>,
    ) -> Result<RunningService<RoleClient, ClientInfo>, String> {
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

        let transport = TokioChildProcess::new(tokio::process::Command::new(command).configure(|cmd| {
            cmd.args(args)
                .envs(env.iter())
                .stderr(std::process::Stdio::inherit());
        }))
        .map_err(|e| format!("spawn {}: {}", command, e))?;

        client_info()
            .serve(transport)
            .await
            .map_err(|e| format!("initialize stdio client: {}", e))
    }

    #[cfg(unix)]
    async fn connect_unix(path: &std::path::Path) -> Result<RunningService<RoleClient, ClientInfo>, String> {
        let stream = tokio::net::UnixStream::connect(path)
            .await
            .map_err(|e| format!("connect {}: {}", path.display(), e))?;

        client_info()
            .serve(stream)
            .await
            .map_err(|e| format!("initialize unix client: {}", e))
    }

    #[cfg(not(unix))]
    async fn connect_unix(_path: &std::path::Path) -> Result<RunningService<RoleClient, ClientInfo>, String> {
        Err("unix sockets are not supported on this platform".to_string())
    }

    /// Server name and version reported during the handshake
    pub fn server_label(&self) -> Option<&str> {
        self.server_label.as_deref()
    }

    pub async fn is_closed(&self) -> bool {
        self.service.lock().await.is_none()
    }

    async fn ensure_open(&self) -> SessionResult<()> {
        if self.is_closed().await {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "tooluse".to_string(),
            title: Some("Tooluse".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Map a failed `tools/call` onto the invocation error taxonomy
fn invocation_error(tool: &str, error: ServiceError) -> SessionError {
    match error {
        ServiceError::McpError(data) if data.code == ErrorCode::INVALID_PARAMS => {
            SessionError::invalid_arguments(tool, data.message.to_string())
        }
        ServiceError::McpError(data) if data.code == ErrorCode::METHOD_NOT_FOUND => {
            SessionError::tool_not_found(tool)
        }
        other => SessionError::remote_execution(tool, other.to_string()),
    }
}

#[async_trait]
impl ToolSession for McpSession {
    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }

    fn session_id(&self) -> Option<String> {
        // rmcp keeps the streamable HTTP session id inside its transport worker
        None
    }

    async fn list_tools(&self) -> SessionResult<ToolCatalog> {
        self.ensure_open().await?;

        let mut tools = Vec::new();
        let mut cursor = None;
        loop {
            let request = ClientRequest::ListToolsRequest(ListToolsRequest::with_param(PaginatedRequestParams {
                meta: None,
                cursor,
            }));
            let page = match self.peer.send_request(request).await {
                Ok(ServerResult::ListToolsResult(page)) => page,
                // rmcp falls back to a raw value when a page does not parse as tools
                Ok(ServerResult::CustomResult(CustomResult(raw))) => {
                    return Err(malformed_listing(tools.len(), &raw));
                }
                Ok(other) => {
                    let raw = serde_json::to_value(&other).map_err(|e| SessionError::Discovery(e.to_string()))?;
                    return Err(malformed_listing(tools.len(), &raw));
                }
                Err(e) => return Err(SessionError::Discovery(e.to_string())),
            };
            tools.extend(page.tools);
            cursor = page.next_cursor;
            if cursor.is_none() {
                break;
            }
        }
        let catalog = catalog_from_mcp(tools)?;

        log_info!(self.logger, "[McpSession] Listed {} tools", catalog.len());
        *self.known_tools.write() = Some(catalog.iter().map(|t| t.name.clone()).collect());

        Ok(catalog)
    }

    async fn invoke(&self, tool_name: &str, arguments: JsonObject) -> SessionResult<String> {
        self.ensure_open().await?;

        if let Some(known) = self.known_tools.read().as_ref() {
            if !known.iter().any(|name| name == tool_name) {
                return Err(SessionError::tool_not_found(tool_name));
            }
        }

        log_debug!(self.logger, "[McpSession] Calling tool: {}", tool_name);

        let params = CallToolRequestParams {
            meta: None,
            name: tool_name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| invocation_error(tool_name, e))?;

        let text = match result.content.first().map(|c| &c.raw) {
            Some(RawContent::Text(t)) => t.text.clone(),
            _ => String::new(),
        };

        if result.is_error.unwrap_or(false) {
            return Err(SessionError::remote_execution(tool_name, text));
        }

        Ok(text)
    }

    async fn close(&self) -> SessionResult<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        log_info!(self.logger, "[McpSession] Closing connection to {}", self.endpoint);
        if let Err(e) = service.cancel().await {
            log_warn!(self.logger, "[McpSession] Close failed: {}", e);
            return Err(SessionError::Close(e.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpSession")
            .field("endpoint", &self.endpoint)
            .field("server", &self.server_label)
            .finish()
    }
}
