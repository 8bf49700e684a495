use crate::config::ProviderConfig;
use crate::providers::{LanguageModel, ModelError, ModelReply, ModelRequest, TokenUsage};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, ModelError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| {
                ModelError::Unavailable(
                    "ANTHROPIC_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        Ok(AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        AnthropicProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 2000,
        }
    }
}

#[async_trait]
impl LanguageModel for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .timeout(request.timeout)
            .json(&json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "system": request.system,
                "messages": [
                    {"role": "user", "content": request.user}
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Unavailable(format!(
                "anthropic endpoint returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        debug!("{:?}", body);

        let text = body["content"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ModelError::NoOutput("no text content in anthropic response".to_string())
            })?
            .to_string();

        let usage = TokenUsage {
            prompt: body["usage"]["input_tokens"].as_u64().unwrap_or(0),
            completion: body["usage"]["output_tokens"].as_u64().unwrap_or(0),
        };

        Ok(ModelReply { text, usage })
    }
}
