use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::normalize::steps::is_section_heading;

/// Measurement system inferred from the ingredient units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Us,
}

/// One parsed ingredient line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Verbatim decoded line, always non-empty
    pub original: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub item: Option<String>,
    pub note: Option<String>,
}

/// One cooking instruction, numbered from 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub n: u32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeYield {
    pub servings: Option<u32>,
    pub original: Option<String>,
}

/// Times in whole minutes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeTimes {
    pub prep: Option<u32>,
    pub cook: Option<u32>,
    pub total: Option<u32>,
}

impl RecipeTimes {
    /// Resolve `total`: prep + cook when both are present, total is absent
    /// and the sum is positive.
    pub fn resolve_total(&mut self) {
        if self.total.is_none() {
            if let (Some(prep), Some(cook)) = (self.prep, self.cook) {
                if prep + cook > 0 {
                    self.total = Some(prep + cook);
                }
            }
        }
    }
}

/// Reserved for future diet inference; never populated by the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietFlags {
    pub vegan: Option<bool>,
    pub vegetarian: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
}

/// Where and when the page was fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub fetched_at: String,
}

impl Source {
    /// Capture the source at normalization time
    pub fn capture(url: &str) -> Self {
        let domain = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()));
        Source {
            url: url.to_string(),
            domain,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

/// The canonical recipe record. Immutable once produced by a normalizer:
/// enrichment builds a new record via structural merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub r#yield: RecipeYield,
    pub time: RecipeTimes,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub tags: Vec<String>,
    pub diet_flags: DietFlags,
    pub units: UnitSystem,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_notes: Option<String>,
}

impl Recipe {
    /// Gate predicate for cascade short-circuiting
    pub fn is_structurally_complete(&self) -> bool {
        !self.ingredients.is_empty() && !self.steps.is_empty()
    }

    /// Check the record invariants. A failure here is recoverable: the
    /// cascade falls through to the next strategy.
    pub fn validate(&self) -> Result<(), IngestError> {
        for ingredient in &self.ingredients {
            if ingredient.original.trim().is_empty() {
                return Err(IngestError::Validation(
                    "ingredient with empty original line".to_string(),
                ));
            }
            if let Some(quantity) = ingredient.quantity {
                if quantity < 0.0 || !quantity.is_finite() {
                    return Err(IngestError::Validation(format!(
                        "ingredient quantity out of range: {quantity}"
                    )));
                }
            }
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.n != (i + 1) as u32 {
                return Err(IngestError::Validation(format!(
                    "step {} numbered {}, expected {}",
                    i,
                    step.n,
                    i + 1
                )));
            }
            if step.text.trim().is_empty() {
                return Err(IngestError::Validation("empty step text".to_string()));
            }
            if is_section_heading(&step.text) {
                return Err(IngestError::Validation(format!(
                    "section heading in steps: {}",
                    step.text
                )));
            }
        }
        Ok(())
    }
}

/// Append tags, lowercased and de-duplicated case-insensitively while
/// preserving insertion order.
pub(crate) fn merge_tags(tags: &mut Vec<String>, candidates: impl IntoIterator<Item = String>) {
    for candidate in candidates {
        let tag = candidate.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
}
