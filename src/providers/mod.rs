mod anthropic;
mod factory;
mod open_ai;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use open_ai::OpenAIProvider;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// One system/user message pair sent to a model. Generation parameters
/// (temperature, max output tokens) live on the provider, which reads
/// them from its configuration.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub user: String,
    pub timeout: Duration,
}

/// Token counters as reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt += other.prompt;
        self.completion += other.completion;
    }
}

/// Raw model output plus accounting
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Typed failures from a model call. Schema conformance is checked by the
/// caller, which owns the target payload type.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The response carried no usable text content
    #[error("Model returned no usable output: {0}")]
    NoOutput(String),

    /// The call exceeded its time budget
    #[error("Model call timed out")]
    Timeout,

    /// The provider endpoint rejected the request or is unreachable
    #[error("Model provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Unavailable(e.to_string())
        }
    }
}

/// Unified trait for all language-model providers
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send one message pair and return the raw completion text
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;
}
