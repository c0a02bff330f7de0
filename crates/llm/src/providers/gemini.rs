//! Google Gemini provider (Generative Language API).

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use agora_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        let generation_config = (request.temperature.is_some() || request.max_tokens.is_some())
            .then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            });

        GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Gemini");

        // Key goes in a header, never in the URL
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to send request to Gemini: {}",
                    e.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        let content = extract_text(&body)
            .ok_or_else(|| AppError::Llm("Gemini response contained no candidates".to_string()))?;

        let usage = body
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}

fn extract_text(body: &GenerateResponse) -> Option<String> {
    let parts = &body.candidates.first()?.content.as_ref()?.parts;
    if parts.is_empty() {
        return None;
    }
    Some(parts.iter().map(|p| p.text.as_str()).collect())
}
