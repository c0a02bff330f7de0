//! Agent runtime: renders a role prompt and asks the completion capability.

use crate::roles::RoleDefinition;
use crate::types::Turn;
use agora_core::{AppError, AppResult};
use agora_llm::completion::fallback_placeholder;
use agora_llm::{CompletionCapability, LOCAL_MODE_ACTIVE};
use handlebars::Handlebars;
use std::sync::Arc;

const AGENT_TEMPLATE_NAME: &str = "agent";

const AGENT_TEMPLATE: &str = "
CONTEXT FROM DOCUMENTS:
{{context}}

USER QUERY:
{{query}}

DEBATE HISTORY:
{{history}}

YOUR ROLE: {{name}} ({{role}})
INSTRUCTION: {{instruction}}

STRICT RULE: Answer ONLY for what is asked. Do not add conversational fillers. Do not add \"hello\" or \"hope this helps\". Just the facts.
Provide your response according to your role. Be precise, use the context provided, and cite sources (PDF/TXT file names) when possible.
";

/// Runs debate roles against a completion capability.
pub struct AgentRuntime {
    capability: Arc<dyn CompletionCapability>,
    templates: Handlebars<'static>,
}

impl AgentRuntime {
    pub fn new(capability: Arc<dyn CompletionCapability>) -> AppResult<Self> {
        let mut templates = Handlebars::new();
        templates.register_escape_fn(handlebars::no_escape);
        templates
            .register_template_string(AGENT_TEMPLATE_NAME, AGENT_TEMPLATE)
            .map_err(|e| AppError::Debate(format!("Failed to register agent template: {}", e)))?;

        Ok(Self {
            capability,
            templates,
        })
    }

    /// Whether agent calls reach a model at all.
    pub fn is_model_backed(&self) -> bool {
        self.capability.is_available()
    }

    /// Render the full prompt for one agent turn.
    pub fn render_prompt(
        &self,
        role: &RoleDefinition,
        context: &str,
        query: &str,
        history: &[Turn],
    ) -> AppResult<String> {
        let history = history
            .iter()
            .map(|turn| format!("{}: {}", turn.agent, turn.content))
            .collect::<Vec<_>>()
            .join("\n");

        let variables = serde_json::json!({
            "context": context,
            "query": query,
            "history": history,
            "name": role.name,
            "role": role.role_label,
            "instruction": role.instruction,
        });

        self.templates
            .render(AGENT_TEMPLATE_NAME, &variables)
            .map_err(|e| AppError::Debate(format!("Failed to render agent prompt: {}", e)))
    }

    /// Produce one contribution for `role`.
    ///
    /// Without a backend this is the local-mode placeholder. Backend failures
    /// are absorbed by the capability and surface as placeholder text.
    pub async fn run(
        &self,
        role: &RoleDefinition,
        context: &str,
        query: &str,
        history: &[Turn],
    ) -> String {
        if !self.capability.is_available() {
            return LOCAL_MODE_ACTIVE.to_string();
        }

        let prompt = match self.render_prompt(role, context, query, history) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(agent = role.name, "{}", e);
                return fallback_placeholder(query);
            }
        };

        tracing::debug!(agent = role.name, prompt_len = prompt.len(), "Running agent");
        self.capability.generate(&prompt, role.instruction).await
    }
}
