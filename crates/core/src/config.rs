//! Configuration management for Agora.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.agora/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Relative paths in the config file are resolved against
//! the workspace.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Embedding providers the knowledge crate knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .agora/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Corpus, chunking, embedding, and retrieval settings
    pub knowledge: KnowledgeSettings,

    /// Completion backends
    pub llm: LlmSettings,
}

/// Corpus and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgeSettings {
    /// Directory holding the `.txt` corpus (default: `<workspace>/knowledge_base`)
    pub corpus_dir: Option<PathBuf>,

    /// Directory for the persisted index (default: `<workspace>/.agora/index`)
    pub index_dir: Option<PathBuf>,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,

    /// Nearest neighbours fetched before lexical re-scoring
    pub candidate_pool: usize,

    /// Default number of chunks returned by a search
    pub top_k: usize,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            corpus_dir: None,
            index_dir: None,
            chunk_size: 1000,
            chunk_overlap: 150,
            candidate_pool: 20,
            top_k: 5,
            embedding: EmbeddingSettings::default(),
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Endpoint for HTTP providers
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Completion backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    /// Backend tried first
    #[serde(default)]
    pub primary: Option<BackendConfig>,

    /// Backend tried once when the primary fails
    #[serde(default)]
    pub secondary: Option<BackendConfig>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature sent with every completion (backend default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Output token cap sent with every completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl LlmSettings {
    /// Derive backends from the well-known API key variables.
    ///
    /// Gemini is preferred when `GEMINI_API_KEY` is set, with OpenAI as the
    /// failover when `OPENAI_API_KEY` is also set.
    pub fn from_environment() -> Self {
        let gemini = std::env::var("GEMINI_API_KEY").is_ok().then(BackendConfig::gemini);
        let openai = std::env::var("OPENAI_API_KEY").is_ok().then(BackendConfig::openai);

        let (primary, secondary) = match (gemini, openai) {
            (Some(g), o) => (Some(g), o),
            (None, o) => (o, None),
        };

        Self {
            primary,
            secondary,
            ..Self::default()
        }
    }

    /// Whether any completion backend is configured.
    pub fn is_configured(&self) -> bool {
        self.primary.is_some()
    }
}

/// A single completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv", default = "default_gemini_key_env")]
        api_key_env: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default)]
        endpoint: Option<String>,
    },
    #[serde(rename = "openai")]
    OpenAI {
        #[serde(rename = "apiKeyEnv", default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default)]
        endpoint: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        model: String,
    },
}

fn default_gemini_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

impl BackendConfig {
    /// Gemini backend with default key variable and model.
    pub fn gemini() -> Self {
        Self::Gemini {
            api_key_env: default_gemini_key_env(),
            model: default_gemini_model(),
            endpoint: None,
        }
    }

    /// OpenAI backend with default key variable and model.
    pub fn openai() -> Self {
        Self::OpenAI {
            api_key_env: default_openai_key_env(),
            model: default_openai_model(),
            endpoint: None,
        }
    }

    /// Canonical provider name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::OpenAI { .. } => "openai",
            Self::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::OpenAI { model, .. } | Self::Ollama { model, .. } => {
                model
            }
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } | Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Environment variable holding the API key, for hosted backends.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::Gemini { api_key_env, .. } | Self::OpenAI { api_key_env, .. } => {
                Some(api_key_env)
            }
            Self::Ollama { .. } => None,
        }
    }

    /// Resolve the API key from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env().and_then(|var| std::env::var(var).ok())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    knowledge: Option<KnowledgeSettings>,
    llm: Option<LlmSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            knowledge: KnowledgeSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file, and the environment.
    ///
    /// Environment variables:
    /// - `AGORA_WORKSPACE`: Override workspace path
    /// - `AGORA_CONFIG`: Path to config file
    /// - `AGORA_CORPUS_DIR`: Corpus directory
    /// - `AGORA_INDEX_DIR`: Persisted index directory
    /// - `GEMINI_API_KEY` / `OPENAI_API_KEY`: Backends when the file has no `llm` section
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_for(None)
    }

    /// Like [`load`](Self::load), but reads the config file of `workspace`
    /// when one is given (for example from `--workspace`).
    pub fn load_for(workspace: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("AGORA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("AGORA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.agora_dir().join("config.yaml"));

        let llm_from_file = if config_path.exists() {
            let (merged, has_llm) = config.merge_yaml(&config_path)?;
            config = merged;
            has_llm
        } else {
            false
        };

        if !llm_from_file {
            let timeout_secs = config.llm.timeout_secs;
            config.llm = LlmSettings {
                timeout_secs,
                ..LlmSettings::from_environment()
            };
        }

        if let Ok(dir) = std::env::var("AGORA_CORPUS_DIR") {
            config.knowledge.corpus_dir = Some(PathBuf::from(dir));
        }

        if let Ok(dir) = std::env::var("AGORA_INDEX_DIR") {
            config.knowledge.index_dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    ///
    /// Returns the merged config and whether the file carried an `llm` section.
    fn merge_yaml(&self, path: &Path) -> AppResult<(Self, bool)> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(knowledge) = config_file.knowledge {
            result.knowledge = knowledge;
        }

        let has_llm = config_file.llm.is_some();
        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok((result, has_llm))
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the file and the environment.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        corpus_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(corpus_dir) = corpus_dir {
            self.knowledge.corpus_dir = Some(corpus_dir);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .agora directory.
    pub fn agora_dir(&self) -> PathBuf {
        self.workspace.join(".agora")
    }

    /// Ensure the .agora directory exists.
    pub fn ensure_agora_dir(&self) -> AppResult<()> {
        let agora_dir = self.agora_dir();
        if !agora_dir.exists() {
            std::fs::create_dir_all(&agora_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .agora directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolved corpus directory.
    pub fn corpus_dir(&self) -> PathBuf {
        self.resolve(self.knowledge.corpus_dir.as_deref(), || {
            self.workspace.join("knowledge_base")
        })
    }

    /// Resolved persisted-index directory.
    pub fn index_dir(&self) -> PathBuf {
        self.resolve(self.knowledge.index_dir.as_deref(), || {
            self.agora_dir().join("index")
        })
    }

    fn resolve(&self, configured: Option<&Path>, default: impl FnOnce() -> PathBuf) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.workspace.join(path),
            None => default(),
        }
    }

    /// Validate settings that would otherwise fail deep inside a command.
    pub fn validate(&self) -> AppResult<()> {
        let knowledge = &self.knowledge;

        if knowledge.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }

        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                knowledge.chunk_overlap, knowledge.chunk_size
            )));
        }

        if knowledge.candidate_pool == 0 {
            return Err(AppError::Config(
                "candidatePool must be greater than 0".to_string(),
            ));
        }

        let provider = knowledge.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        for backend in [&self.llm.primary, &self.llm.secondary].into_iter().flatten() {
            if let Some(env_var) = backend.api_key_env() {
                if std::env::var(env_var).is_err() {
                    return Err(AppError::Config(format!(
                        "API key for {} backend not found in environment variable: {}",
                        backend.kind(),
                        env_var
                    )));
                }
            }
        }

        if self.llm.secondary.is_some() && self.llm.primary.is_none() {
            return Err(AppError::Config(
                "llm.secondary requires llm.primary".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.knowledge.chunk_size, 1000);
        assert_eq!(config.knowledge.chunk_overlap, 150);
        assert_eq!(config.knowledge.candidate_pool, 20);
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.knowledge.embedding.provider, "trigram");
        assert!(!config.llm.is_configured());
        assert_eq!(config.llm.timeout_secs, 60);
    }

    #[test]
    fn test_default_paths() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/agora");
        assert_eq!(config.corpus_dir(), PathBuf::from("/srv/agora/knowledge_base"));
        assert_eq!(config.index_dir(), PathBuf::from("/srv/agora/.agora/index"));
    }

    #[test]
    fn test_relative_paths_resolve_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/agora");
        config.knowledge.corpus_dir = Some(PathBuf::from("docs"));
        config.knowledge.index_dir = Some(PathBuf::from("/var/cache/agora"));
        assert_eq!(config.corpus_dir(), PathBuf::from("/srv/agora/docs"));
        assert_eq!(config.index_dir(), PathBuf::from("/var/cache/agora"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("/tmp/ws")),
            Some(PathBuf::from("corpus")),
            None,
            true,
            false,
        );

        assert_eq!(config.workspace, PathBuf::from("/tmp/ws"));
        assert_eq!(config.corpus_dir(), PathBuf::from("/tmp/ws/corpus"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
logging:
  level: warn
  color: false
knowledge:
  chunkSize: 800
  chunkOverlap: 100
  embedding:
    provider: ollama
    model: nomic-embed-text
    dimensions: 768
llm:
  primary:
    kind: ollama
    model: llama3.2
  secondary:
    kind: openai
  timeoutSecs: 15
  temperature: 0.2
  maxTokens: 1024
"#,
        )
        .unwrap();

        let (merged, has_llm) = AppConfig::default().merge_yaml(&path).unwrap();
        assert!(has_llm);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert_eq!(merged.knowledge.chunk_size, 800);
        assert_eq!(merged.knowledge.candidate_pool, 20);
        assert_eq!(merged.knowledge.embedding.dimensions, 768);
        assert_eq!(merged.llm.timeout_secs, 15);
        assert_eq!(merged.llm.temperature, Some(0.2));
        assert_eq!(merged.llm.max_tokens, Some(1024));

        let primary = merged.llm.primary.unwrap();
        assert_eq!(primary.kind(), "ollama");
        assert_eq!(primary.endpoint(), Some("http://localhost:11434"));

        let secondary = merged.llm.secondary.unwrap();
        assert_eq!(secondary, BackendConfig::openai());
        assert_eq!(secondary.api_key_env(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_load_for_reads_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".agora")).unwrap();
        std::fs::write(
            temp.path().join(".agora").join("config.yaml"),
            "knowledge:\n  chunkSize: 640\n  chunkOverlap: 64\n",
        )
        .unwrap();

        let config = AppConfig::load_for(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.knowledge.chunk_size, 640);
        assert_eq!(config.knowledge.chunk_overlap, 64);
    }

    #[test]
    fn test_load_for_missing_workspace_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = AppConfig::load_for(Some(missing)).unwrap_err();
        assert!(err.to_string().contains("Workspace directory does not exist"));
    }

    #[test]
    fn test_validate_default() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_overlap_too_large() {
        let mut config = AppConfig::default();
        config.knowledge.chunk_overlap = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.knowledge.embedding.provider = "faiss".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_validate_missing_api_key() {
        let mut config = AppConfig::default();
        config.llm.primary = Some(BackendConfig::Gemini {
            api_key_env: "AGORA_TEST_UNSET_KEY_VAR".to_string(),
            model: "gemini-1.5-pro".to_string(),
            endpoint: None,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("AGORA_TEST_UNSET_KEY_VAR"));
    }

    #[test]
    fn test_validate_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.llm.primary = Some(BackendConfig::Ollama {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        });
        assert!(config.validate().is_ok());
    }
}
