use log::debug;
use scraper::Selector;
use serde_json::Value;

use super::{Extractor, ParsingContext, Strategy};
use crate::error::IngestError;
use crate::model::Recipe;
use crate::normalize::structured::recipe_from_structured;

pub struct JsonLdExtractor;

/// Clean common defects in embedded JSON-LD before parsing
fn sanitize_json(json_str: &str) -> String {
    let mut cleaned = json_str.trim().to_string();

    // some sites wrap the block in CDATA or HTML comments
    cleaned = cleaned.replace("<!--", "").replace("-->", "");

    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find(['{', '[']) {
            cleaned = cleaned[start..].to_string();
        }
    }

    // trailing commas before a closing brace/bracket
    cleaned.replace(",]", "]").replace(",}", "}")
}

/// Depth-first search for the first node whose `@type` contains "recipe",
/// descending through arrays, `@graph` containers and nested values.
fn find_recipe_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if type_contains_recipe(map.get("@type")) {
                return Some(value);
            }
            map.values().find_map(find_recipe_node)
        }
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        _ => None,
    }
}

fn type_contains_recipe(type_value: Option<&Value>) -> bool {
    match type_value {
        Some(Value::String(s)) => s.to_lowercase().contains("recipe"),
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Value::String(s) if s.to_lowercase().contains("recipe"))),
        _ => false,
    }
}

impl Extractor for JsonLdExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::JsonLd
    }

    fn extract(&self, context: &ParsingContext) -> Result<Recipe, IngestError> {
        let selector = Selector::parse("script[type='application/ld+json']").unwrap();

        for script in context.document.select(&selector) {
            let cleaned = sanitize_json(&script.inner_html());
            let parsed = match serde_json::from_str::<Value>(&cleaned) {
                Ok(value) => value,
                Err(e) => {
                    // malformed blocks are unusable sources, not errors
                    debug!("skipping malformed JSON-LD block: {e}");
                    continue;
                }
            };
            if let Some(node) = find_recipe_node(&parsed) {
                debug!("found JSON-LD recipe node on {}", context.url);
                return recipe_from_structured(node, &context.url);
            }
        }

        Err(IngestError::Extraction(
            "no JSON-LD recipe node in any script block".to_string(),
        ))
    }
}
