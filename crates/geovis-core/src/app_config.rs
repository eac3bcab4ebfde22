use std::path::PathBuf;

/// Connection settings for one OpenAI-compatible LLM provider.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Short label used in logs and on score rows (`primary`, `secondary`).
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only the database-backed commands require this.
    pub database_url: Option<String>,
    pub log_level: String,
    pub entities_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Providers in fallback priority order. Unconfigured providers are absent.
    pub llm_providers: Vec<ProviderConfig>,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub llm_retries_per_provider: u32,
    pub max_concurrent_answers: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("entities_path", &self.entities_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("llm_providers", &self.llm_providers)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("llm_retries_per_provider", &self.llm_retries_per_provider)
            .field("max_concurrent_answers", &self.max_concurrent_answers)
            .finish()
    }
}
