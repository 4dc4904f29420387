//! Configuration
//!
//! A single YAML file describes the chat model, the tool server endpoint and
//! orchestration knobs. `FileConfigProvider` reads it at user or workspace
//! level.

mod error;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use file::{ConfigFile, ConfigLevel, FileConfigProvider, ModelSettings, OrchestratorSettings};
