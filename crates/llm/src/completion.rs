//! Completion service with single failover.
//!
//! Agents never see backend errors: a failed or timed-out primary call is
//! retried once on the secondary backend, and if that fails too the caller
//! gets a clearly marked placeholder built from the prompt.

use crate::client::{LlmClient, LlmRequest};
use crate::factory::create_backend;
use agora_core::config::LlmSettings;
use agora_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Returned by `generate` when no backend is configured.
pub const LOCAL_MODE_ACTIVE: &str = "LOCAL_MODE_ACTIVE";

const PLACEHOLDER_PROMPT_CHARS: usize = 100;

/// Text generation as seen by the debate agents.
#[async_trait::async_trait]
pub trait CompletionCapability: Send + Sync {
    /// Whether a model-backed path is available at all.
    fn is_available(&self) -> bool;

    /// Generate text for `prompt` under the given role instruction.
    ///
    /// Never fails; degraded output is returned as a placeholder string.
    async fn generate(&self, prompt: &str, role_instruction: &str) -> String;
}

/// A client bound to the model it should be asked for.
#[derive(Clone)]
pub struct Backend {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl Backend {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("provider", &self.provider_name())
            .field("model", &self.model)
            .finish()
    }
}

/// Primary/secondary completion service.
#[derive(Debug, Clone)]
pub struct CompletionService {
    primary: Option<Backend>,
    secondary: Option<Backend>,
    timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl CompletionService {
    pub fn new(primary: Option<Backend>, secondary: Option<Backend>, timeout: Duration) -> Self {
        Self {
            primary,
            secondary,
            timeout,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling options applied to every request.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// A service with no backends; every agent takes the local path.
    pub fn disabled() -> Self {
        Self::new(None, None, Duration::from_secs(60))
    }

    /// Build the service from configured backends.
    pub fn from_settings(settings: &LlmSettings) -> AppResult<Self> {
        let primary = settings.primary.as_ref().map(create_backend).transpose()?;
        let secondary = settings.secondary.as_ref().map(create_backend).transpose()?;

        match (&primary, &secondary) {
            (Some(p), Some(s)) => tracing::info!(
                primary = p.provider_name(),
                secondary = s.provider_name(),
                "Completion backends configured"
            ),
            (Some(p), None) => {
                tracing::info!(primary = p.provider_name(), "Completion backend configured")
            }
            _ => tracing::info!("No completion backend configured, using local mode"),
        }

        Ok(Self::new(
            primary,
            secondary,
            Duration::from_secs(settings.timeout_secs),
        )
        .with_sampling(settings.temperature, settings.max_tokens))
    }

    async fn call(&self, backend: &Backend, prompt: &str, role_instruction: &str) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, backend.model()).with_system(role_instruction);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = tokio::time::timeout(self.timeout, backend.client.complete(&request))
            .await
            .map_err(|_| {
                AppError::Llm(format!(
                    "{} call timed out after {:?}",
                    backend.provider_name(),
                    self.timeout
                ))
            })??;

        Ok(response.content)
    }
}

/// Placeholder returned when every configured backend failed.
pub fn fallback_placeholder(prompt: &str) -> String {
    let head: String = prompt.chars().take(PLACEHOLDER_PROMPT_CHARS).collect();
    format!("Local RAG Fallback: {}...", head)
}

#[async_trait::async_trait]
impl CompletionCapability for CompletionService {
    fn is_available(&self) -> bool {
        self.primary.is_some()
    }

    async fn generate(&self, prompt: &str, role_instruction: &str) -> String {
        let Some(primary) = &self.primary else {
            return LOCAL_MODE_ACTIVE.to_string();
        };

        match self.call(primary, prompt, role_instruction).await {
            Ok(text) => return text,
            Err(e) => tracing::warn!(
                provider = primary.provider_name(),
                error = %e,
                "Primary completion backend failed"
            ),
        }

        if let Some(secondary) = &self.secondary {
            tracing::info!(provider = secondary.provider_name(), "Switching to secondary backend");
            match self.call(secondary, prompt, role_instruction).await {
                Ok(text) => return text,
                Err(e) => tracing::warn!(
                    provider = secondary.provider_name(),
                    error = %e,
                    "Secondary completion backend failed"
                ),
            }
        }

        fallback_placeholder(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmResponse, LlmUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedClient {
        name: &'static str,
        reply: Option<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedClient {
        fn ok(name: &'static str, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: Some(reply),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn slow(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: Some("too late"),
                delay: Duration::from_secs(5),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.reply {
                Some(reply) => Ok(LlmResponse {
                    content: reply.to_string(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                }),
                None => Err(AppError::Llm("boom".to_string())),
            }
        }
    }

    fn service(primary: Arc<ScriptedClient>, secondary: Option<Arc<ScriptedClient>>) -> CompletionService {
        CompletionService::new(
            Some(Backend::new(primary, "primary-model")),
            secondary.map(|s| Backend::new(s, "secondary-model")),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_disabled_service_reports_local_mode() {
        let service = CompletionService::disabled();
        assert!(!service.is_available());
        assert_eq!(service.generate("prompt", "role").await, LOCAL_MODE_ACTIVE);
    }

    #[tokio::test]
    async fn test_primary_success() {
        let primary = ScriptedClient::ok("gemini", "answer");
        let secondary = ScriptedClient::ok("openai", "other");
        let service = service(primary.clone(), Some(secondary.clone()));

        assert_eq!(service.generate("q", "r").await, "answer");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sampling_settings_reach_requests() {
        let primary = ScriptedClient::ok("gemini", "answer");
        let service = service(primary.clone(), None).with_sampling(Some(0.3), Some(512));

        service.generate("q", "Direct Answerer").await;
        let requests = primary.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.3));
        assert_eq!(requests[0].max_tokens, Some(512));
        assert_eq!(requests[0].system.as_deref(), Some("Direct Answerer"));
        assert_eq!(requests[0].model, "primary-model");
    }

    #[tokio::test]
    async fn test_failover_to_secondary() {
        let primary = ScriptedClient::failing("gemini");
        let secondary = ScriptedClient::ok("openai", "rescued");
        let service = service(primary.clone(), Some(secondary.clone()));

        assert_eq!(service.generate("q", "r").await, "rescued");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let service = service(ScriptedClient::slow("gemini"), Some(ScriptedClient::ok("openai", "fast")));
        assert_eq!(service.generate("q", "r").await, "fast");
    }

    #[tokio::test]
    async fn test_placeholder_after_both_fail() {
        let prompt = "x".repeat(250);
        let service = service(ScriptedClient::failing("gemini"), Some(ScriptedClient::failing("openai")));

        let output = service.generate(&prompt, "r").await;
        assert!(output.starts_with("Local RAG Fallback: "));
        assert_eq!(output, format!("Local RAG Fallback: {}...", "x".repeat(100)));
    }

    #[test]
    fn test_placeholder_respects_char_boundaries() {
        let prompt = "é".repeat(150);
        let output = fallback_placeholder(&prompt);
        assert_eq!(output.chars().filter(|c| *c == 'é').count(), 100);
    }
}
