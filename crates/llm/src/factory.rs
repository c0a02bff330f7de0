//! LLM provider factory.
//!
//! Builds clients from provider names or from the configured backends,
//! resolving API keys from the environment.

use crate::client::LlmClient;
use crate::completion::Backend;
use crate::providers::{GeminiClient, OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use agora_core::config::BackendConfig;
use agora_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key for hosted providers
///
/// # Errors
/// Returns error if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Llm(format!("Unknown provider: {}", provider)))?;

    let api_key = match (provider_type.requires_api_key(), api_key) {
        (true, None) => {
            return Err(AppError::Llm(format!(
                "{} provider requires API key",
                provider_type.as_str()
            )))
        }
        (_, key) => key.unwrap_or_default(),
    };

    let client: Arc<dyn LlmClient> = match (provider_type, endpoint) {
        (ProviderType::Ollama, Some(url)) => Arc::new(OllamaClient::with_base_url(url)),
        (ProviderType::Ollama, None) => Arc::new(OllamaClient::new()),
        (ProviderType::OpenAI, Some(url)) => Arc::new(OpenAiClient::with_base_url(api_key, url)),
        (ProviderType::OpenAI, None) => Arc::new(OpenAiClient::new(api_key)),
        (ProviderType::Gemini, Some(url)) => Arc::new(GeminiClient::with_base_url(api_key, url)),
        (ProviderType::Gemini, None) => Arc::new(GeminiClient::new(api_key)),
    };

    Ok(client)
}

/// Create a completion backend from configuration.
pub fn create_backend(config: &BackendConfig) -> AppResult<Backend> {
    let api_key = config.resolve_api_key();
    if let (Some(env_var), None) = (config.api_key_env(), api_key.as_ref()) {
        return Err(AppError::Llm(format!(
            "{} backend requires environment variable {}",
            config.kind(),
            env_var
        )));
    }

    let client = create_client(config.kind(), config.endpoint(), api_key.as_deref())?;
    tracing::debug!(provider = config.kind(), model = config.model(), "Created completion backend");
    Ok(Backend::new(client, config.model()))
}
