use log::debug;
use scraper::{ElementRef, Selector};
use serde_json::{Map, Value};

use super::{Extractor, ParsingContext, Strategy};
use crate::error::IngestError;
use crate::model::Recipe;
use crate::normalize::structured::recipe_from_structured;

pub struct MicrodataExtractor;

fn itemtype_is_recipe(itemtype: &str) -> bool {
    itemtype
        .split_whitespace()
        .any(|t| t.to_lowercase().contains("schema.org/recipe"))
}

/// Pick the `@type` to record from a (possibly multi-valued) itemtype,
/// preferring the value that names a recipe.
fn preferred_type(itemtype: &str) -> String {
    let tokens: Vec<&str> = itemtype.split_whitespace().collect();
    tokens
        .iter()
        .find(|t| t.to_lowercase().contains("recipe"))
        .or_else(|| tokens.first())
        .map(|t| t.to_string())
        .unwrap_or_default()
}

/// Read the value an element contributes for its itemprop: a `content`
/// attribute wins, then tag-specific attributes, then trimmed text.
fn itemprop_value(element: ElementRef) -> String {
    if let Some(content) = element.value().attr("content") {
        return content.trim().to_string();
    }
    let attr = match element.value().name() {
        "time" => element.value().attr("datetime"),
        "link" | "a" | "area" => element.value().attr("href"),
        "img" | "source" => element.value().attr("src"),
        _ => None,
    };
    if let Some(attr) = attr {
        return attr.trim().to_string();
    }
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn accumulate(map: &mut Map<String, Value>, prop: &str, value: Value) {
    match map.get_mut(prop) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(prop.to_string(), value);
        }
    }
}

/// Build an object from an itemscope element by walking its descendants.
/// A descendant carrying its own itemscope becomes a nested object and is
/// not descended into further: nested scopes are opaque units.
fn collect_scope(root: ElementRef) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(itemtype) = root.value().attr("itemtype") {
        map.insert("@type".to_string(), Value::String(preferred_type(itemtype)));
    }
    for child in root.children() {
        if let Some(element) = ElementRef::wrap(child) {
            collect_properties(element, &mut map);
        }
    }
    map
}

fn collect_properties(element: ElementRef, map: &mut Map<String, Value>) {
    let is_scope = element.value().attr("itemscope").is_some();
    if let Some(prop) = element.value().attr("itemprop") {
        // a property may be multi-valued; split_whitespace handles the
        // rare multi-name itemprop attribute as well
        let value = if is_scope {
            Value::Object(collect_scope(element))
        } else {
            Value::String(itemprop_value(element))
        };
        for name in prop.split_whitespace() {
            accumulate(map, name, value.clone());
        }
        if is_scope {
            return;
        }
    } else if is_scope {
        // an unnamed nested item does not belong to this scope
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_properties(child_element, map);
        }
    }
}

impl Extractor for MicrodataExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Microdata
    }

    fn extract(&self, context: &ParsingContext) -> Result<Recipe, IngestError> {
        let selector = Selector::parse("[itemscope][itemtype]").unwrap();
        let container = context
            .document
            .select(&selector)
            .find(|el| {
                el.value()
                    .attr("itemtype")
                    .is_some_and(itemtype_is_recipe)
            })
            .ok_or_else(|| {
                IngestError::Extraction("no microdata Recipe scope found".to_string())
            })?;

        debug!("found microdata recipe scope on {}", context.url);
        let object = Value::Object(collect_scope(container));
        recipe_from_structured(&object, &context.url)
    }
}
