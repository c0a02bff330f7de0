//! Concrete completion providers.

mod gemini;
mod ollama;
mod openai;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
