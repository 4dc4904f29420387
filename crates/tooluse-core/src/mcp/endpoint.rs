//! Tool server endpoint description
//!
//! Every variant speaks the same MCP protocol; only the transport differs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default streamable HTTP endpoint
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8050/mcp";

/// Where and how to reach a tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum ServerEndpoint {
    /// Streamable HTTP server, already running
    Http { url: String },
    /// Local server spawned as a child process, spoken to over stdio
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
    /// Server listening on a Unix domain socket
    Unix { path: PathBuf },
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        ServerEndpoint::Http {
            url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl ServerEndpoint {
    pub fn http(url: impl Into<String>) -> Self {
        ServerEndpoint::Http { url: url.into() }
    }

    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        ServerEndpoint::Stdio {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    pub fn unix(path: impl Into<PathBuf>) -> Self {
        ServerEndpoint::Unix { path: path.into() }
    }

    /// Short transport name for diagnostics
    pub fn transport(&self) -> &'static str {
        match self {
            ServerEndpoint::Http { .. } => "http",
            ServerEndpoint::Stdio { .. } => "stdio",
            ServerEndpoint::Unix { .. } => "unix",
        }
    }

    /// Reject endpoints that cannot possibly connect
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ServerEndpoint::Http { url } if url.trim().is_empty() => {
                Err("http endpoint requires a url".to_string())
            }
            ServerEndpoint::Http { url } if !(url.starts_with("http://") || url.starts_with("https://")) => {
                Err(format!("http endpoint url must start with http:// or https://, got {url}"))
            }
            ServerEndpoint::Stdio { command, .. } if command.trim().is_empty() => {
                Err("stdio endpoint requires a command".to_string())
            }
            ServerEndpoint::Unix { path } if path.as_os_str().is_empty() => {
                Err("unix endpoint requires a socket path".to_string())
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerEndpoint::Http { url } => write!(f, "{}", url),
            ServerEndpoint::Stdio { command, args, .. } => {
                write!(f, "stdio:{}", command)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            ServerEndpoint::Unix { path } => write!(f, "unix:{}", path.display()),
        }
    }
}
