//! Map a raw structured-data object (JSON-LD or microdata) or a heuristic
//! scrape into the canonical Recipe record.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::IngestError;
use crate::model::{
    merge_tags, Ingredient, Recipe, RecipeTimes, RecipeYield, Source,
};
use crate::normalize::coerce::{to_string_array, to_string_coerce};
use crate::normalize::decode_entities;
use crate::normalize::duration::{minutes_from_iso8601, scan_text_minutes};
use crate::normalize::ingredient::parse_ingredient_line;
use crate::normalize::steps::normalize_steps;
use crate::normalize::units::infer_unit_system;

static LEADING_REPEAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(\d+)").unwrap());
static FIRST_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// What the DOM-heuristics scraper hands to the normalizer (and to the
/// LLM context builder as extraction hints).
#[derive(Debug, Clone, Default)]
pub struct RawScrape {
    pub title: Option<String>,
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Build a Recipe from a schema.org-shaped object. Validation failure is
/// recoverable: the caller falls through to the next strategy.
pub fn recipe_from_structured(node: &Value, url: &str) -> Result<Recipe, IngestError> {
    let title = field_string(node, "name");
    let description = field_string(node, "description");
    let image = first_image_url(node.get("image"));
    let author = first_author_name(node.get("author"));
    let r#yield = parse_yield(node.get("recipeYield"));

    let mut time = RecipeTimes {
        prep: node.get("prepTime").and_then(minutes_from_iso8601),
        cook: node.get("cookTime").and_then(minutes_from_iso8601),
        total: node.get("totalTime").and_then(minutes_from_iso8601),
    };

    let ingredients = parse_ingredient_field(node);

    let mut lines = Vec::new();
    if let Some(instructions) = node.get("recipeInstructions") {
        flatten_instructions(instructions, &mut lines);
    }
    let steps = normalize_steps(lines);

    // free-text cook-time signal, only when structured timing is absent
    if time.cook.is_none() && time.total.is_none() {
        if let Some(minutes) = scan_text_minutes(steps.iter().map(|s| s.text.as_str())) {
            debug!("cook time {minutes}m scanned from instruction text");
            time.cook = Some(minutes);
        }
    }
    time.resolve_total();

    let mut tags = Vec::new();
    for field in ["keywords", "recipeCategory", "recipeCuisine"] {
        if let Some(value) = node.get(field) {
            merge_tags(&mut tags, to_string_array(value));
        }
    }

    let units = infer_unit_system(ingredients.iter().filter_map(|i| i.unit.as_deref()));

    let recipe = Recipe {
        title,
        description,
        image,
        author,
        r#yield,
        time,
        ingredients,
        steps,
        tags,
        diet_flags: Default::default(),
        units,
        source: Source::capture(url),
        llm_notes: None,
    };
    recipe.validate()?;
    Ok(recipe)
}

/// Build a Recipe from a heuristic scrape. Description, author, yield and
/// times are unknown at this level; `llm_notes` records the provenance.
pub fn recipe_from_scrape(
    scrape: &RawScrape,
    url: &str,
    provenance: &str,
) -> Result<Recipe, IngestError> {
    let ingredients: Vec<Ingredient> = scrape
        .ingredients
        .iter()
        .filter_map(|line| parse_ingredient_line(line))
        .collect();
    let steps = normalize_steps(scrape.steps.iter().cloned());
    let units = infer_unit_system(ingredients.iter().filter_map(|i| i.unit.as_deref()));

    let recipe = Recipe {
        title: scrape.title.as_deref().map(decode_entities),
        description: None,
        image: scrape.image.clone(),
        author: None,
        r#yield: RecipeYield::default(),
        time: RecipeTimes::default(),
        ingredients,
        steps,
        tags: Vec::new(),
        diet_flags: Default::default(),
        units,
        source: Source::capture(url),
        llm_notes: Some(provenance.to_string()),
    };
    recipe.validate()?;
    Ok(recipe)
}

fn field_string(node: &Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(to_string_coerce)
        .map(|s| decode_entities(&s))
}

fn parse_ingredient_field(node: &Value) -> Vec<Ingredient> {
    let lines = node
        .get("recipeIngredient")
        .map(to_string_array)
        .filter(|lines| !lines.is_empty())
        .or_else(|| node.get("ingredients").map(to_string_array))
        .unwrap_or_default();
    lines
        .iter()
        .filter_map(|line| parse_ingredient_line(line))
        .collect()
}

/// image: string | {url} | array of either, first resolvable URL wins
fn first_image_url(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Object(map) => map.get("url").and_then(to_string_coerce),
        Value::Array(items) => items.iter().find_map(|item| first_image_url(Some(item))),
        _ => None,
    }
}

/// author: string | {name} | array, first resolvable name wins
fn first_author_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(decode_entities(trimmed))
            }
        }
        Value::Object(map) => map
            .get("name")
            .and_then(to_string_coerce)
            .map(|s| decode_entities(&s)),
        Value::Array(items) => items.iter().find_map(|item| first_author_name(Some(item))),
        _ => None,
    }
}

fn parse_yield(value: Option<&Value>) -> RecipeYield {
    let Some(value) = value else {
        return RecipeYield::default();
    };
    if let Some(n) = value.as_u64() {
        return RecipeYield {
            servings: Some(n as u32),
            original: Some(n.to_string()),
        };
    }
    let Some(text) = to_string_coerce(value) else {
        return RecipeYield::default();
    };
    let text = dedup_repeated_number(&decode_entities(&text));
    let servings = FIRST_INT_RE
        .find(&text)
        .and_then(|m| m.as_str().parse::<u32>().ok());
    RecipeYield {
        servings,
        original: Some(text),
    }
}

/// Collapse "4 4 people" into "4 people"; sites often emit the numeric
/// yield twice when both a value and a display string are present.
fn dedup_repeated_number(text: &str) -> String {
    if let Some(caps) = LEADING_REPEAT_RE.captures(text) {
        if caps[1] == caps[2] {
            return format!("{}{}", &caps[1], &text[caps.get(2).unwrap().end()..]);
        }
    }
    text.to_string()
}

/// Flatten recipeInstructions: a plain string splits on newlines; arrays
/// recurse; step objects contribute text/name; HowToSection nests further
/// steps under itemListElement.
fn flatten_instructions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(s.lines().map(|l| l.to_string())),
        Value::Array(items) => {
            for item in items {
                flatten_instructions(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(nested) = map.get("itemListElement") {
                flatten_instructions(nested, out);
            } else if let Some(text) = map
                .get("text")
                .or_else(|| map.get("name"))
                .and_then(to_string_coerce)
            {
                out.push(text);
            }
        }
        _ => {}
    }
}
