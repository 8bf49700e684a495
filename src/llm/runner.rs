//! Last-resort extraction and selective enrichment through a language
//! model, with an explicit retry/repair loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::LlmConfig;
use crate::error::IngestError;
use crate::llm::cache::ResponseCache;
use crate::llm::context::{build_user_context, LlmInputs};
use crate::llm::{EnrichmentPayload, ExtractionPayload};
use crate::model::{merge_tags, Ingredient, Recipe, RecipeTimes, RecipeYield, Source};
use crate::normalize::ingredient::parse_ingredient_line;
use crate::normalize::steps::normalize_steps;
use crate::normalize::units::infer_unit_system;
use crate::providers::{LanguageModel, ModelError, ModelRequest, TokenUsage};

const MAX_ATTEMPTS: u32 = 3;

const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You're an expert at finding recipes in messy web page text.
Extract the recipe and output only this JSON object without any other characters:

{
  "title": "<TITLE OR null>",
  "description": "<SHORT DESCRIPTION OR null>",
  "servings": <INTEGER OR null>,
  "servings_text": "<ORIGINAL YIELD TEXT OR null>",
  "prep_minutes": <INTEGER OR null>,
  "cook_minutes": <INTEGER OR null>,
  "total_minutes": <INTEGER OR null>,
  "ingredients": [<ONE STRING PER INGREDIENT LINE>],
  "steps": [<ONE STRING PER INSTRUCTION>],
  "notes": "<ANYTHING WORTH FLAGGING OR null>",
  "tags": [<LOWERCASE KEYWORDS>],
  "cuisines": [<CUISINES IF STATED>],
  "methods": [<COOKING METHODS IF OBVIOUS>]
}

Keep ingredient lines verbatim from the page. Do not invent quantities,
times or servings the page does not state.
"#;

const ENRICHMENT_SYSTEM_PROMPT: &str = r#"
You're filling gaps in an already-extracted recipe from its source page text.
Output only this JSON object without any other characters, using null for
anything the page does not state:

{
  "title": "<TITLE OR null>",
  "description": "<SHORT DESCRIPTION OR null>",
  "servings": <INTEGER OR null>,
  "servings_text": "<ORIGINAL YIELD TEXT OR null>",
  "prep_minutes": <INTEGER OR null>,
  "cook_minutes": <INTEGER OR null>,
  "total_minutes": <INTEGER OR null>,
  "tags": [<LOWERCASE KEYWORDS>],
  "cuisines": [<CUISINES IF STATED>],
  "methods": [<COOKING METHODS IF OBVIOUS>]
}

Never guess. A null is better than an invented value.
"#;

const COMPACT_OUTPUT_HINT: &str = "Return compact, fully closed JSON with short step sentences. Output the JSON object only: no prose, no code fences.";

/// The retry loop as an explicit state machine so the budget and exit
/// conditions stay auditable.
enum RetryState {
    Attempting,
    RepairingSchema(String),
    ShrinkingContext,
}

enum ParseFailure {
    /// Output was not parseable JSON at all
    NotJson(String),
    /// JSON parsed but did not conform to the payload schema
    Schema(String),
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.strip_suffix("```").unwrap_or(rest);
        return rest.trim();
    }
    trimmed
}

fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<(T, Value), ParseFailure> {
    let cleaned = strip_code_fences(text);
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| ParseFailure::NotJson(e.to_string()))?;
    let payload = serde_json::from_value(value.clone())
        .map_err(|e: serde_json::Error| ParseFailure::Schema(e.to_string()))?;
    Ok((payload, value))
}

pub struct RecipeLlm {
    model: Box<dyn LanguageModel>,
    cache: Arc<ResponseCache>,
    settings: LlmConfig,
}

impl RecipeLlm {
    pub fn new(model: Box<dyn LanguageModel>, cache: Arc<ResponseCache>, settings: LlmConfig) -> Self {
        RecipeLlm {
            model,
            cache,
            settings,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.model.provider_name()
    }

    /// Full extraction from reduced page text. Any failure is a soft
    /// "no result"; the cascade ends without a recipe rather than erroring.
    pub async fn extract_recipe(
        &self,
        inputs: &LlmInputs,
        key: u64,
    ) -> Option<(Recipe, TokenUsage)> {
        let (payload, usage): (ExtractionPayload, TokenUsage) =
            self.request_payload(EXTRACTION_SYSTEM_PROMPT, inputs, key).await?;
        match recipe_from_llm(&payload, inputs, self.model.provider_name()) {
            Ok(recipe) => Some((recipe, usage)),
            Err(e) => {
                warn!("llm extraction produced an invalid recipe: {e}");
                None
            }
        }
    }

    /// Fill gaps in an already-normalized recipe without overwriting
    /// present values; tags are always unioned.
    pub async fn enrich_recipe(
        &self,
        recipe: &Recipe,
        inputs: &LlmInputs,
        key: u64,
    ) -> Option<(Recipe, TokenUsage)> {
        let (payload, usage): (EnrichmentPayload, TokenUsage) =
            self.request_payload(ENRICHMENT_SYSTEM_PROMPT, inputs, key).await?;
        match merge_enrichment(recipe, &payload) {
            Ok(merged) => Some((merged, usage)),
            Err(e) => {
                warn!("enrichment merge failed validation, keeping original: {e}");
                None
            }
        }
    }

    async fn request_payload<T: DeserializeOwned>(
        &self,
        system: &str,
        inputs: &LlmInputs,
        key: u64,
    ) -> Option<(T, TokenUsage)> {
        if let Some(cached) = self.cache.get(key) {
            if let Ok(payload) = serde_json::from_value::<T>(cached) {
                return Some((payload, TokenUsage::default()));
            }
        }

        let mut usage = TokenUsage::default();
        let mut state = RetryState::Attempting;
        let mut timeout = Duration::from_secs(self.settings.attempt_timeout_secs);

        for attempt in 1..=MAX_ATTEMPTS {
            let (budget, hint) = match &state {
                RetryState::Attempting => (self.settings.context_chars, None),
                RetryState::RepairingSchema(message) => (
                    self.settings.context_chars,
                    Some(format!(
                        "The previous response did not match the required schema: {message}. \
                         Return a corrected JSON object."
                    )),
                ),
                RetryState::ShrinkingContext => (
                    self.settings.shrunk_context_chars,
                    Some(COMPACT_OUTPUT_HINT.to_string()),
                ),
            };

            let mut user = build_user_context(inputs, budget);
            if let Some(hint) = hint {
                user.push_str("\n\n");
                user.push_str(&hint);
            }

            debug!(
                "llm attempt {attempt}/{MAX_ATTEMPTS} ({} chars of context)",
                user.len()
            );

            let request = ModelRequest {
                system: system.to_string(),
                user,
                timeout,
            };
            match self.model.complete(&request).await {
                Ok(reply) => {
                    usage.add(reply.usage);
                    match parse_payload::<T>(&reply.text) {
                        Ok((payload, value)) => {
                            self.cache.put(key, value);
                            return Some((payload, usage));
                        }
                        Err(ParseFailure::NotJson(e)) => {
                            debug!("unparseable model output, shrinking context: {e}");
                            state = RetryState::ShrinkingContext;
                        }
                        Err(ParseFailure::Schema(e)) => {
                            debug!("schema mismatch, retrying with repair hint: {e}");
                            state = RetryState::RepairingSchema(e);
                        }
                    }
                }
                Err(ModelError::Timeout) => {
                    warn!("model call timed out on attempt {attempt}, extending budget");
                    timeout *= 2;
                }
                Err(e) => {
                    // provider unavailable: fast-fail, no retry
                    warn!("model provider failed, giving up: {e}");
                    return None;
                }
            }
        }

        warn!("llm retry budget exhausted after {MAX_ATTEMPTS} attempts");
        None
    }
}

fn recipe_from_llm(
    payload: &ExtractionPayload,
    inputs: &LlmInputs,
    provider: &str,
) -> Result<Recipe, IngestError> {
    let ingredients: Vec<Ingredient> = payload
        .ingredients
        .iter()
        .filter_map(|line| parse_ingredient_line(line))
        .collect();
    let steps = normalize_steps(payload.steps.iter().cloned());

    let mut time = RecipeTimes {
        prep: payload.prep_minutes,
        cook: payload.cook_minutes,
        total: payload.total_minutes,
    };
    time.resolve_total();

    let mut tags = Vec::new();
    merge_tags(
        &mut tags,
        payload
            .tags
            .iter()
            .chain(&payload.cuisines)
            .chain(&payload.methods)
            .cloned(),
    );

    let units = infer_unit_system(ingredients.iter().filter_map(|i| i.unit.as_deref()));
    let r#yield = RecipeYield {
        servings: payload.servings,
        original: payload
            .servings_text
            .clone()
            .or_else(|| payload.servings.map(|s| s.to_string())),
    };

    let llm_notes = match &payload.notes {
        Some(notes) => format!("llm-fallback extraction via {provider}: {notes}"),
        None => format!("llm-fallback extraction via {provider}"),
    };

    let recipe = Recipe {
        title: payload.title.clone(),
        description: payload.description.clone(),
        image: inputs.hints.image.clone(),
        author: None,
        r#yield,
        time,
        ingredients,
        steps,
        tags,
        diet_flags: Default::default(),
        units,
        source: Source::capture(&inputs.url),
        llm_notes: Some(llm_notes),
    };
    recipe.validate()?;
    Ok(recipe)
}

/// Structural merge: only fills nulls/empties, except tags which are
/// unioned. The merged record is re-validated before being returned.
pub(crate) fn merge_enrichment(
    base: &Recipe,
    payload: &EnrichmentPayload,
) -> Result<Recipe, IngestError> {
    let mut merged = base.clone();

    if merged.title.is_none() {
        merged.title = payload.title.clone();
    }
    if merged.description.is_none() {
        merged.description = payload.description.clone();
    }
    if merged.r#yield.servings.is_none() {
        merged.r#yield.servings = payload.servings;
    }
    if merged.r#yield.original.is_none() {
        merged.r#yield.original = payload.servings_text.clone();
    }
    if merged.time.prep.is_none() {
        merged.time.prep = payload.prep_minutes;
    }
    if merged.time.cook.is_none() {
        merged.time.cook = payload.cook_minutes;
    }
    if merged.time.total.is_none() {
        merged.time.total = payload.total_minutes;
    }
    merged.time.resolve_total();

    merge_tags(
        &mut merged.tags,
        payload
            .tags
            .iter()
            .chain(&payload.cuisines)
            .chain(&payload.methods)
            .cloned(),
    );

    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Step;

    fn base_recipe() -> Recipe {
        Recipe {
            title: Some("Original Title".to_string()),
            description: None,
            image: None,
            author: None,
            r#yield: RecipeYield::default(),
            time: RecipeTimes {
                prep: Some(10),
                cook: None,
                total: None,
            },
            ingredients: vec![Ingredient {
                original: "1 cup rice".to_string(),
                quantity: Some(1.0),
                unit: Some("cup".to_string()),
                item: Some("rice".to_string()),
                note: None,
            }],
            steps: vec![Step {
                n: 1,
                text: "Cook the rice.".to_string(),
            }],
            tags: vec!["dinner".to_string()],
            diet_flags: Default::default(),
            units: Default::default(),
            source: Source::capture("https://example.com/rice"),
            llm_notes: None,
        }
    }

    #[test]
    fn test_enrichment_never_overwrites_present_title() {
        let payload = EnrichmentPayload {
            title: Some("A Different Title".to_string()),
            description: Some("Fluffy rice.".to_string()),
            ..Default::default()
        };
        let merged = merge_enrichment(&base_recipe(), &payload).unwrap();
        assert_eq!(merged.title.as_deref(), Some("Original Title"));
        assert_eq!(merged.description.as_deref(), Some("Fluffy rice."));
    }

    #[test]
    fn test_enrichment_unions_tags() {
        let payload = EnrichmentPayload {
            tags: vec!["Dinner".to_string(), "rice".to_string()],
            cuisines: vec!["Japanese".to_string()],
            methods: vec!["steaming".to_string()],
            ..Default::default()
        };
        let merged = merge_enrichment(&base_recipe(), &payload).unwrap();
        assert_eq!(merged.tags, vec!["dinner", "rice", "japanese", "steaming"]);
    }

    #[test]
    fn test_enrichment_total_recomputed_from_filled_cook() {
        let payload = EnrichmentPayload {
            cook_minutes: Some(20),
            ..Default::default()
        };
        let merged = merge_enrichment(&base_recipe(), &payload).unwrap();
        assert_eq!(merged.time.cook, Some(20));
        assert_eq!(merged.time.total, Some(30));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    }

    #[test]
    fn test_parse_payload_distinguishes_failures() {
        let not_json = parse_payload::<ExtractionPayload>("this is prose");
        assert!(matches!(not_json, Err(ParseFailure::NotJson(_))));

        // valid JSON but missing the required ingredients/steps arrays
        let schema = parse_payload::<ExtractionPayload>(r#"{"title": "x"}"#);
        assert!(matches!(schema, Err(ParseFailure::Schema(_))));

        let ok = parse_payload::<ExtractionPayload>(
            r#"{"title": "x", "ingredients": ["1 cup a"], "steps": ["Mix."]}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_recipe_from_llm_reparses_ingredient_lines() {
        let payload = ExtractionPayload {
            title: Some("Garlic Bread".to_string()),
            description: None,
            servings: Some(4),
            servings_text: None,
            prep_minutes: Some(5),
            cook_minutes: Some(10),
            total_minutes: None,
            ingredients: vec!["3-4 cloves garlic, minced".to_string()],
            steps: vec!["Toast the bread.".to_string()],
            notes: None,
            tags: vec!["Bread".to_string()],
            cuisines: vec![],
            methods: vec!["baking".to_string()],
        };
        let inputs = LlmInputs {
            url: "https://example.com/garlic-bread".to_string(),
            hints: Default::default(),
            page_text: String::new(),
        };
        let recipe = recipe_from_llm(&payload, &inputs, "openai").unwrap();
        assert_eq!(recipe.ingredients[0].quantity, Some(3.0));
        assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("clove"));
        assert_eq!(recipe.time.total, Some(15));
        assert_eq!(recipe.tags, vec!["bread", "baking"]);
        assert_eq!(recipe.r#yield.original.as_deref(), Some("4"));
        assert!(recipe
            .llm_notes
            .as_deref()
            .unwrap()
            .contains("llm-fallback extraction via openai"));
    }
}
