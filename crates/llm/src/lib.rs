//! LLM integration crate for Agora.
//!
//! This crate provides a provider-agnostic abstraction for text completion
//! and the failover service the debate agents call through.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API
//! - **OpenAI**: Chat completions API
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use agora_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod completion;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use completion::{Backend, CompletionCapability, CompletionService, LOCAL_MODE_ACTIVE};
pub use factory::{create_backend, create_client};
pub use providers::{GeminiClient, OllamaClient, OpenAiClient};
pub use types::ProviderType;
