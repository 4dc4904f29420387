//! File-based configuration (YAML)
//!
//! Supports user-level (~/.config/tooluse/config.yaml) and workspace-level
//! (.config/tooluse/config.yaml) files. A missing file yields defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::mcp::ServerEndpoint;
use super::error::{ConfigError, ConfigResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Chat model settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Tool server to connect to
    #[serde(default)]
    pub server: ServerEndpoint,

    /// Orchestration behaviour
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

impl ConfigFile {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Yaml(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::invalid("model.model must not be empty"));
        }
        if self.model.provider.trim().is_empty() {
            return Err(ConfigError::invalid("model.provider must not be empty"));
        }
        if self.orchestrator.query_timeout_secs == Some(0) {
            return Err(ConfigError::invalid("orchestrator.query_timeout_secs must be positive"));
        }
        self.server.validate().map_err(ConfigError::Invalid)
    }
}

/// Chat model settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider id (`openai` for any OpenAI-compatible endpoint, or `mock`)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier as used by the provider's API
    #[serde(default = "default_model")]
    pub model: String,
    /// Custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: None,
            api_key_env: default_api_key_env(),
        }
    }
}

impl ModelSettings {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Orchestration behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Run the tool calls of one pass concurrently
    #[serde(default = "default_parallel")]
    pub parallel_tool_calls: bool,
    /// Abort a query that takes longer than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_secs: Option<u64>,
}

fn default_parallel() -> bool {
    true
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            parallel_tool_calls: default_parallel(),
            query_timeout_secs: None,
        }
    }
}

impl OrchestratorSettings {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/tooluse/config.yaml)
    User,
    /// Workspace-level config (.config/tooluse/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use tooluse_core::config::FileConfigProvider;
///
/// let config = FileConfigProvider::user().get_config()?;
/// println!("model: {}", config.model.model);
/// # Ok::<(), tooluse_core::config::ConfigError>(())
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/tooluse/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("tooluse").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/tooluse/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("tooluse").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        ConfigFile::from_yaml_str(&content)
    }

    /// Save config to file
    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)
            .map_err(|e| ConfigError::Yaml(format!("Failed to serialize YAML: {}", e)))?;

        fs::write(&self.path, content)?;
        *self.cache.write() = Some(config.clone());

        Ok(())
    }

    /// Get cached or load config
    pub fn get_config(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }

        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}
