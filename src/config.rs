use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Main pipeline configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Default provider to use when not specified
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Outer page-fetch timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
    /// LLM fallback/enrichment settings
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Configuration for a specific model provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4o-mini", "claude-3-5-haiku-latest")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Configuration for the LLM fallback and enrichment passes
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Whether the LLM strategies run at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the enrichment pass runs after a successful extraction
    #[serde(default)]
    pub enrich: bool,
    /// Response-cache entry lifetime in hours
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// Character budget for the prompt context
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
    /// Hard cap applied when a retry shrinks the context
    #[serde(default = "default_shrunk_context_chars")]
    pub shrunk_context_chars: usize,
    /// Per-attempt model-call timeout in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            enabled: true,
            enrich: false,
            cache_ttl_hours: default_cache_ttl_hours(),
            context_chars: default_context_chars(),
            shrunk_context_chars: default_shrunk_context_chars(),
            attempt_timeout_secs: default_attempt_timeout(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "openai".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_context_chars() -> usize {
    12_000
}

fn default_shrunk_context_chars() -> usize {
    4_000
}

fn default_attempt_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE__PROVIDERS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: RECIPE__PROVIDERS__OPENAI__API_KEY
            .add_source(
                Environment::with_prefix("RECIPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
