use log::debug;
use scraper::{Html, Selector};

use super::{Extractor, ParsingContext, Strategy};
use crate::error::IngestError;
use crate::model::Recipe;
use crate::normalize::structured::{recipe_from_scrape, RawScrape};

pub struct HeuristicsExtractor;

const TITLE_SELECTORS: &[&str] = &["h1[itemprop='name']", "h1", "title"];

/// Common recipe-site ingredient markup, most specific first. WordPress
/// Recipe Maker, Tasty Recipes and Mediavine Create cover a large share
/// of food blogs.
const INGREDIENT_SELECTORS: &[&str] = &[
    ".wprm-recipe-ingredient",
    ".tasty-recipes-ingredients li",
    ".mv-create-ingredients li",
    "[itemprop='recipeIngredient']",
    "[itemprop='ingredients']",
    ".recipe-ingredients li",
    ".recipe-ingredient-list li",
    ".recipe-card-ingredients li",
    ".wpzoom-recipe-ingredients li",
    "ul.ingredients li",
    ".ingredients li",
    ".ingredient",
];

const STEP_SELECTORS: &[&str] = &[
    ".wprm-recipe-instruction",
    ".tasty-recipes-instructions li",
    ".mv-create-instructions li",
    "[itemprop='recipeInstructions'] li",
    "[itemprop='recipeInstructions']",
    ".recipe-instructions li",
    ".recipe-directions li",
    ".wpzoom-recipe-instructions li",
    "ol.instructions li",
    ".instructions li",
    ".directions li",
    ".instruction",
];

fn element_texts(document: &Html, selector_str: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| {
            el.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .find_map(|s| element_texts(document, s).into_iter().next())
}

fn first_group(document: &Html, selectors: &[&str], min_len: usize) -> Vec<String> {
    for selector in selectors {
        let texts = element_texts(document, selector);
        if texts.len() >= min_len {
            debug!("selector group '{selector}' matched {} entries", texts.len());
            return texts;
        }
    }
    Vec::new()
}

fn page_image(document: &Html) -> Option<String> {
    let og = Selector::parse("meta[property='og:image']").unwrap();
    if let Some(content) = document
        .select(&og)
        .next()
        .and_then(|el| el.value().attr("content"))
    {
        let content = content.trim();
        if !content.is_empty() {
            return Some(content.to_string());
        }
    }
    let img = Selector::parse("img[src]").unwrap();
    document
        .select(&img)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty())
}

/// Best-effort, markup-convention-driven scrape. Ingredients need at
/// least two hits before a selector group is trusted; steps need one.
pub fn scrape_document(document: &Html) -> RawScrape {
    RawScrape {
        title: first_text(document, TITLE_SELECTORS),
        image: page_image(document),
        ingredients: first_group(document, INGREDIENT_SELECTORS, 2),
        steps: first_group(document, STEP_SELECTORS, 1),
    }
}

impl Extractor for HeuristicsExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::Heuristics
    }

    fn extract(&self, context: &ParsingContext) -> Result<Recipe, IngestError> {
        let scrape = scrape_document(&context.document);
        if scrape.ingredients.is_empty() && scrape.steps.is_empty() {
            return Err(IngestError::Extraction(
                "no recipe-shaped markup matched".to_string(),
            ));
        }
        recipe_from_scrape(&scrape, &context.url, "extracted by dom heuristics")
    }
}
