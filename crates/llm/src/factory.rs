//! Provider factory.
//!
//! Creates provider instances from application configuration: resolves the
//! provider name, injects the shared local runtime or the hosted
//! credential, and applies per-provider settings from the config file.

use std::sync::Arc;
use std::time::Duration;

use booksum_core::config::ProviderConfig;
use booksum_core::{AppConfig, AppError, AppResult};

use crate::client::SummarizationProvider;
use crate::providers::{GeminiProvider, InstructProvider, PipelineProvider};
use crate::runtime::LocalRuntime;

use booksum_prompt::Language;

/// Create a provider from the active configuration.
///
/// # Errors
/// - `Config` for an unknown provider name
/// - `ProviderUnavailable` when a hosted provider's credential is missing
pub fn create_provider(config: &AppConfig) -> AppResult<Arc<dyn SummarizationProvider>> {
    let language: Language = config.language.parse()?;

    match config.provider.to_lowercase().as_str() {
        "instruct" => {
            let runtime = match config.get_provider_config("instruct") {
                Some(ProviderConfig::Instruct { endpoint, .. }) => LocalRuntime::shared_at(&endpoint),
                _ => LocalRuntime::shared(),
            };
            let provider =
                InstructProvider::new(runtime, config.model.clone()).with_language(language);
            Ok(Arc::new(provider))
        }
        "pipeline" => {
            let runtime = match config.get_provider_config("pipeline") {
                Some(ProviderConfig::Pipeline { endpoint, .. }) => LocalRuntime::shared_at(&endpoint),
                _ => LocalRuntime::shared(),
            };
            Ok(Arc::new(PipelineProvider::new(runtime, config.model.clone())))
        }
        "gemini" => {
            let api_key = config.resolve_api_key("gemini");
            let mut provider =
                GeminiProvider::new(api_key, config.model.clone())?.with_language(language);

            if let Some(ProviderConfig::Gemini {
                endpoint,
                request_delay,
                ..
            }) = config.get_provider_config("gemini")
            {
                if let Some(endpoint) = endpoint {
                    provider = provider.with_endpoint(endpoint);
                }
                provider = provider
                    .with_request_delay(request_delay.map(Duration::from_secs));
            }

            Ok(Arc::new(provider))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_instruct_provider() {
        let config = AppConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "instruct");
    }

    #[test]
    fn test_create_pipeline_provider() {
        let mut config = AppConfig::default();
        config.provider = "pipeline".to_string();
        config.model = "distilbart-cnn".to_string();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "pipeline");
        assert!(!provider.supports_iterative_refine());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let mut config = AppConfig::default();
        config.provider = "gemini".to_string();
        config.api_key = None;

        match create_provider(&config) {
            Err(AppError::ProviderUnavailable(msg)) => assert!(msg.contains("API key")),
            _ => panic!("Expected ProviderUnavailable for Gemini without API key"),
        }
    }

    #[test]
    fn test_create_gemini_with_key() {
        let mut config = AppConfig::default();
        config.provider = "gemini".to_string();
        config.model = "gemini-2.0-flash-exp".to_string();
        config.api_key = Some("test-key".to_string());

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert!(provider.supports_iterative_refine());
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();

        match create_provider(&config) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            _ => panic!("Expected Config error for unknown provider"),
        }
    }
}
