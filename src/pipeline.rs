//! The strategy cascade: structured extractors in priority order,
//! short-circuiting on the first structurally complete recipe, with the
//! LLM as last resort and an optional enrichment pass.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::config::{AppConfig, LlmConfig, ProviderConfig};
use crate::error::IngestError;
use crate::extract::{document_extractors, ParsingContext, Strategy};
use crate::fetch::Fetcher;
use crate::llm::cache::{cache_key, ResponseCache};
use crate::llm::context::LlmInputs;
use crate::llm::runner::RecipeLlm;
use crate::model::Recipe;
use crate::providers::{ProviderFactory, TokenUsage};

/// The pipeline's externally visible result: a validated recipe, the
/// strategy that produced it, whether enrichment ran, and token spend.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub recipe: Recipe,
    pub strategy: Strategy,
    pub enriched: bool,
    pub usage: TokenUsage,
}

/// Supported LLM providers for the builder API
#[derive(Debug, Clone, Copy)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

/// Everything produced by the synchronous part of a request. The DOM is
/// parsed and dropped in here so nothing non-Send survives to the model
/// calls.
struct CascadePass {
    found: Option<(Recipe, Strategy)>,
    llm_inputs: Option<LlmInputs>,
    extract_key: u64,
    enrich_key: u64,
}

fn run_document_cascade(url: &str, html: &str, want_llm: bool) -> CascadePass {
    let context = ParsingContext::new(url, html);
    let mut found = None;

    for extractor in document_extractors() {
        match extractor.extract(&context) {
            Ok(recipe) if recipe.is_structurally_complete() => {
                info!("strategy {} produced a complete recipe", extractor.strategy());
                found = Some((recipe, extractor.strategy()));
                break;
            }
            Ok(_) => {
                debug!(
                    "strategy {} produced an incomplete recipe, falling through",
                    extractor.strategy()
                );
            }
            Err(e) => {
                debug!("strategy {} failed: {e}", extractor.strategy());
            }
        }
    }

    let llm_inputs = if want_llm {
        let hints = crate::extract::scrape_document(&context.document);
        let page_html = context.reader_html().unwrap_or(html);
        Some(LlmInputs::assemble(url, hints, page_html))
    } else {
        None
    };

    CascadePass {
        found,
        llm_inputs,
        extract_key: cache_key("extract", url, html),
        enrich_key: cache_key("enrich", url, html),
    }
}

/// Which of the fields the enrichment pass can fill are still empty
fn has_gaps(recipe: &Recipe) -> bool {
    recipe.title.is_none()
        || recipe.description.is_none()
        || recipe.time.total.is_none()
        || recipe.r#yield.servings.is_none()
        || recipe.tags.is_empty()
}

pub struct Ingestor {
    fetcher: Fetcher,
    llm: Option<RecipeLlm>,
    enrich: bool,
}

impl Ingestor {
    /// Creates a new builder for configuring the pipeline
    pub fn builder() -> IngestorBuilder {
        IngestorBuilder::default()
    }

    /// Build a pipeline from loaded configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let fetcher = Fetcher::new(Some(Duration::from_secs(config.fetch_timeout)));
        let llm = if config.llm.enabled {
            match ProviderFactory::get_default_provider(config) {
                Ok(model) => {
                    let cache = Arc::new(ResponseCache::new(Duration::from_secs(
                        config.llm.cache_ttl_hours * 3600,
                    )));
                    Some(RecipeLlm::new(model, cache, config.llm.clone()))
                }
                Err(e) => {
                    debug!("llm strategies disabled: {e}");
                    None
                }
            }
        } else {
            None
        };
        Ingestor {
            fetcher,
            llm,
            enrich: config.llm.enrich,
        }
    }

    /// Fetch a page and run the full cascade over it
    pub async fn extract_from_url(&self, url: &str) -> Result<Extraction, IngestError> {
        let html = self.fetcher.fetch(url).await?;
        self.extract_from_html(&html, url).await
    }

    /// Run the cascade over already-fetched HTML
    pub async fn extract_from_html(
        &self,
        html: &str,
        url: &str,
    ) -> Result<Extraction, IngestError> {
        let pass = run_document_cascade(url, html, self.llm.is_some());
        let mut usage = TokenUsage::default();

        let (recipe, strategy) = match pass.found {
            Some(found) => found,
            None => {
                let (Some(llm), Some(inputs)) = (&self.llm, pass.llm_inputs.as_ref()) else {
                    return Err(IngestError::NoRecipe);
                };
                let Some((recipe, llm_usage)) =
                    llm.extract_recipe(inputs, pass.extract_key).await
                else {
                    return Err(IngestError::NoRecipe);
                };
                usage.add(llm_usage);
                if !recipe.is_structurally_complete() {
                    return Err(IngestError::NoRecipe);
                }
                info!("llm fallback produced a complete recipe");
                (recipe, Strategy::LlmFallback)
            }
        };

        let mut enriched = false;
        let recipe = match (&self.llm, pass.llm_inputs.as_ref()) {
            (Some(llm), Some(inputs))
                if self.enrich && strategy != Strategy::LlmFallback && has_gaps(&recipe) =>
            {
                match llm.enrich_recipe(&recipe, inputs, pass.enrich_key).await {
                    Some((merged, llm_usage)) => {
                        usage.add(llm_usage);
                        enriched = true;
                        merged
                    }
                    None => recipe,
                }
            }
            _ => recipe,
        };

        Ok(Extraction {
            recipe,
            strategy,
            enriched,
            usage,
        })
    }
}

/// Builder for configuring the ingest pipeline
#[derive(Debug, Default)]
pub struct IngestorBuilder {
    timeout: Option<Duration>,
    provider: Option<ProviderKind>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    enrich: bool,
    no_llm: bool,
}

impl IngestorBuilder {
    /// Set a timeout for the outer page fetch
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Select the LLM provider for fallback/enrichment
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the API key directly instead of relying on environment
    /// variables or config files
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name for the LLM provider
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the provider endpoint (custom or proxy deployments)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Run the enrichment pass when a successful extraction left gaps
    pub fn enrich(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    /// Disable the LLM strategies entirely
    pub fn no_llm(mut self) -> Self {
        self.no_llm = true;
        self
    }

    /// Build the configured pipeline
    pub fn build(self) -> Result<Ingestor, IngestError> {
        let fetcher = Fetcher::new(self.timeout);

        if self.no_llm {
            return Ok(Ingestor {
                fetcher,
                llm: None,
                enrich: false,
            });
        }

        // explicit builder settings take precedence over config/env
        let llm = if self.provider.is_some() || self.api_key.is_some() || self.model.is_some() {
            let kind = self.provider.unwrap_or(ProviderKind::OpenAi);
            let provider_config = ProviderConfig {
                enabled: true,
                model: self
                    .model
                    .unwrap_or_else(|| kind.default_model().to_string()),
                temperature: 0.2,
                max_tokens: 2000,
                api_key: self.api_key,
                base_url: self.base_url,
            };
            let model = ProviderFactory::create(kind.as_str(), &provider_config)
                .map_err(|e| IngestError::Builder(e.to_string()))?;
            let settings = LlmConfig::default();
            let cache = Arc::new(ResponseCache::new(Duration::from_secs(
                settings.cache_ttl_hours * 3600,
            )));
            Some(RecipeLlm::new(model, cache, settings))
        } else {
            // fall back to config file / environment; a missing key just
            // leaves the LLM strategies off
            match AppConfig::load() {
                Ok(config) if config.llm.enabled => {
                    match ProviderFactory::get_default_provider(&config) {
                        Ok(model) => {
                            let cache = Arc::new(ResponseCache::new(Duration::from_secs(
                                config.llm.cache_ttl_hours * 3600,
                            )));
                            Some(RecipeLlm::new(model, cache, config.llm.clone()))
                        }
                        Err(e) => {
                            debug!("llm strategies disabled: {e}");
                            None
                        }
                    }
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("no usable configuration, llm strategies disabled: {e}");
                    None
                }
            }
        };

        Ok(Ingestor {
            fetcher,
            llm,
            enrich: self.enrich,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_LD_PAGE: &str = r#"<!DOCTYPE html>
    <html><head>
    <script type="application/ld+json">
    {
        "@type": "Recipe",
        "name": "Structured Pasta",
        "recipeIngredient": ["200 g spaghetti", "2 tbsp butter"],
        "recipeInstructions": ["Boil the pasta.", "Toss with butter."]
    }
    </script>
    </head><body>
    <h1>Heuristic Title</h1>
    <ul class="ingredients"><li>9 cups wrong</li><li>8 cups also wrong</li></ul>
    <ol class="instructions"><li>Do something else.</li></ol>
    </body></html>"#;

    #[tokio::test]
    async fn test_cascade_short_circuits_on_json_ld() {
        let ingestor = Ingestor::builder().no_llm().build().unwrap();
        let extraction = ingestor
            .extract_from_html(JSON_LD_PAGE, "https://example.com/pasta")
            .await
            .unwrap();

        assert_eq!(extraction.strategy, Strategy::JsonLd);
        assert_eq!(extraction.recipe.title.as_deref(), Some("Structured Pasta"));
        assert_eq!(extraction.recipe.ingredients[0].original, "200 g spaghetti");
        assert_eq!(extraction.recipe.steps[0].text, "Boil the pasta.");
        assert!(!extraction.enriched);
    }

    #[tokio::test]
    async fn test_heuristics_when_no_structured_data() {
        let html = r#"<html><body>
        <h1>Plain Markup Soup</h1>
        <ul class="ingredients"><li>1 l stock</li><li>2 carrots</li></ul>
        <ol class="instructions"><li>Simmer everything.</li></ol>
        </body></html>"#;
        let ingestor = Ingestor::builder().no_llm().build().unwrap();
        let extraction = ingestor
            .extract_from_html(html, "https://example.com/soup")
            .await
            .unwrap();

        assert_eq!(extraction.strategy, Strategy::Heuristics);
        assert_eq!(extraction.recipe.title.as_deref(), Some("Plain Markup Soup"));
    }

    #[tokio::test]
    async fn test_no_recipe_outcome() {
        let html = "<html><body><p>Nothing edible here.</p></body></html>";
        let ingestor = Ingestor::builder().no_llm().build().unwrap();
        let result = ingestor
            .extract_from_html(html, "https://example.com/empty")
            .await;
        assert!(matches!(result, Err(IngestError::NoRecipe)));
    }

    #[tokio::test]
    async fn test_incomplete_structured_data_falls_through() {
        // JSON-LD has ingredients but no instructions: not structurally
        // complete, so heuristics win
        let html = r#"<html><head>
        <script type="application/ld+json">
        {"@type": "Recipe", "name": "Half a Recipe",
         "recipeIngredient": ["1 cup flour"]}
        </script>
        </head><body>
        <h1>Complete Markup</h1>
        <ul class="ingredients"><li>1 cup flour</li><li>2 eggs</li></ul>
        <ol class="instructions"><li>Combine and bake.</li></ol>
        </body></html>"#;
        let ingestor = Ingestor::builder().no_llm().build().unwrap();
        let extraction = ingestor
            .extract_from_html(html, "https://example.com/half")
            .await
            .unwrap();
        assert_eq!(extraction.strategy, Strategy::Heuristics);
    }
}
