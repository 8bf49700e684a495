pub mod cache;
pub mod context;
pub mod runner;

pub use cache::{cache_key, ResponseCache};
pub use context::LlmInputs;
pub use runner::RecipeLlm;

use serde::Deserialize;

/// The extraction response schema. The model must return exactly this
/// shape; a serde failure here is a schema violation repaired via a
/// retry hint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub servings_text: Option<String>,
    #[serde(default)]
    pub prep_minutes: Option<u32>,
    #[serde(default)]
    pub cook_minutes: Option<u32>,
    #[serde(default)]
    pub total_minutes: Option<u32>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

/// The enrichment response schema: extraction minus ingredients, steps
/// and notes, every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub servings_text: Option<String>,
    #[serde(default)]
    pub prep_minutes: Option<u32>,
    #[serde(default)]
    pub cook_minutes: Option<u32>,
    #[serde(default)]
    pub total_minutes: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}
