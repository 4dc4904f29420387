//! Chat model providers
//!
//! A [`Provider`] turns one [`ChatRequest`] (conversation, tools and a tool
//! choice directive) into one [`AssistantReply`].
//!
//! - `OpenAiProvider`: any OpenAI-compatible chat completions endpoint
//! - `MockProvider`: deterministic replies for tests and offline runs

mod traits;
mod error;
mod openai;
mod mock;

pub use traits::{AssistantReply, ChatRequest, Provider};
pub use error::{ProviderError, ProviderResult};
pub use openai::{OpenAiProvider, OPENAI_API_BASE};
pub use mock::{MockMode, MockProvider};

use std::sync::Arc;

use crate::config::ModelSettings;
use crate::logging::Logger;

/// Create the provider named in `settings`
///
/// `mock` yields an echo provider; anything else is treated as an
/// OpenAI-compatible endpoint.
pub fn create_provider(settings: &ModelSettings, logger: Arc<dyn Logger>) -> ProviderResult<Arc<dyn Provider>> {
    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::echo(logger))),
        _ => Ok(Arc::new(OpenAiProvider::from_settings(settings, logger)?)),
    }
}

/// List the provider ids `create_provider` understands specially
pub fn supported_providers() -> Vec<&'static str> {
    vec!["openai", "mock"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_create_mock_provider() {
        let settings = ModelSettings {
            provider: "Mock".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&settings, Arc::new(NoOpLogger)).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_create_openai_compatible_provider() {
        let settings = ModelSettings {
            provider: "ollama".to_string(),
            api_base: Some("http://localhost:11434/v1".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&settings, Arc::new(NoOpLogger)).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(supported_providers().contains(&"mock"));
    }
}
