use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tooluse_core::{ConfigFile, ServerEndpoint};

/// Ask a chat model questions it can answer with MCP tools.
#[derive(Parser, Debug)]
#[command(name = "tooluse", version, about)]
pub struct Args {
    /// Config file path (defaults to the user config).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log plain prefixed lines instead of tracing output.
    #[arg(long, global = true)]
    pub plain: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a query, calling tools as the model requests.
    Query {
        /// The question to ask.
        text: String,

        /// Abort after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Run requested tools one after another.
        #[arg(long)]
        sequential: bool,
    },

    /// List the tools the server exposes.
    Tools {
        /// Print each tool's input schema.
        #[arg(long)]
        schema: bool,
    },

    /// Invoke one tool directly.
    Call {
        /// Tool name.
        name: String,

        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

/// Flags that take precedence over the config file
#[derive(ClapArgs, Debug, Default)]
pub struct Overrides {
    /// Streamable HTTP server URL.
    #[arg(long, global = true, conflicts_with = "stdio")]
    pub server: Option<String>,

    /// Spawn a local server and talk to it over stdio.
    #[arg(long, global = true)]
    pub stdio: Option<String>,

    /// Argument for the --stdio command (repeatable).
    #[arg(long = "stdio-arg", global = true, requires = "stdio", allow_hyphen_values = true)]
    pub stdio_args: Vec<String>,

    /// Model provider (openai or mock).
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model identifier.
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL.
    #[arg(long, global = true)]
    pub api_base: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ConfigFile) {
        if let Some(url) = &self.server {
            config.server = ServerEndpoint::http(url.clone());
        }
        if let Some(command) = &self.stdio {
            config.server = ServerEndpoint::stdio(command.clone(), self.stdio_args.clone());
        }
        if let Some(provider) = &self.provider {
            config.model.provider = provider.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.model.api_base = Some(api_base.clone());
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let args = Args::try_parse_from(["tooluse", "query", "what is 2+3?", "--timeout", "30"]).unwrap();
        match args.command {
            Command::Query { text, timeout, sequential } => {
                assert_eq!(text, "what is 2+3?");
                assert_eq!(timeout, Some(30));
                assert!(!sequential);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let args = Args::try_parse_from([
            "tooluse",
            "--stdio",
            "python",
            "--stdio-arg",
            "server.py",
            "--provider",
            "mock",
            "tools",
        ])
        .unwrap();

        let mut config = ConfigFile::default();
        args.overrides.apply(&mut config);
        assert_eq!(config.server, ServerEndpoint::stdio("python", vec!["server.py".to_string()]));
        assert_eq!(config.model.provider, "mock");
        assert_eq!(config.model.model, "gpt-4o");
    }

    #[test]
    fn test_server_conflicts_with_stdio() {
        assert!(Args::try_parse_from(["tooluse", "--server", "http://x/mcp", "--stdio", "python", "tools"]).is_err());
    }

    #[test]
    fn test_plain_is_global() {
        let args = Args::try_parse_from(["tooluse", "tools", "--plain", "-v"]).unwrap();
        assert!(args.plain);
        assert!(args.verbose);
    }

    #[test]
    fn test_call_default_args() {
        let args = Args::try_parse_from(["tooluse", "call", "add"]).unwrap();
        assert!(matches!(args.command, Command::Call { ref args, .. } if args == "{}"));
    }
}
