//! Application context shared by all commands.

use agora_core::{config::AppConfig, AppResult};
use agora_debate::DebateOrchestrator;
use agora_knowledge::RetrievalEngine;
use agora_llm::{CompletionCapability, CompletionService};
use std::sync::Arc;

/// Services for one CLI invocation, constructed in dependency order.
pub struct AppContext {
    pub config: AppConfig,
    pub retrieval: RetrievalEngine,
    pub orchestrator: DebateOrchestrator,
}

impl AppContext {
    /// Build the services. With `warm_up` the index is loaded or rebuilt
    /// before any search; a failed warm-up leaves search empty.
    pub async fn initialize(config: AppConfig, warm_up: bool) -> AppResult<Self> {
        let retrieval = RetrievalEngine::from_config(&config)?;

        let completion: Arc<dyn CompletionCapability> =
            Arc::new(CompletionService::from_settings(&config.llm)?);
        let orchestrator = DebateOrchestrator::new(completion)?;

        if warm_up {
            match retrieval.warm_up().await {
                Ok(outcome) => {
                    tracing::info!(chunks = outcome.chunk_count(), "Knowledge base ready")
                }
                Err(e) => tracing::warn!("Knowledge base unavailable: {}", e),
            }
        }

        Ok(Self {
            config,
            retrieval,
            orchestrator,
        })
    }

    pub fn default_top_k(&self) -> usize {
        self.config.knowledge.top_k
    }
}
