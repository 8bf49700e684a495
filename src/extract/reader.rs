use log::{debug, warn};
use scraper::Html;
use url::Url;

use super::{scrape_document, Extractor, ParsingContext, Strategy};
use crate::error::IngestError;
use crate::model::Recipe;
use crate::normalize::structured::recipe_from_scrape;

/// Strip boilerplate with the readability provider and re-run the DOM
/// heuristics over the simplified article HTML.
pub struct ReaderExtractor;

/// Simplified article HTML for a page, or None when the page has no
/// extractable article content. Failures are logged, never propagated:
/// this is a best-effort enhancement.
pub fn simplify_html(html: &str, url: &str) -> Option<String> {
    let base = match Url::parse(url) {
        Ok(base) => base,
        Err(e) => {
            warn!("readability skipped, unparseable base url {url}: {e}");
            return None;
        }
    };
    match readability::extractor::extract(&mut html.as_bytes(), &base) {
        Ok(product) if !product.content.trim().is_empty() => {
            debug!("readability produced {} bytes of article html", product.content.len());
            Some(product.content)
        }
        Ok(_) => None,
        Err(e) => {
            warn!("readability extraction failed for {url}: {e:?}");
            None
        }
    }
}

impl Extractor for ReaderExtractor {
    fn strategy(&self) -> Strategy {
        Strategy::ReadabilityHeuristics
    }

    fn extract(&self, context: &ParsingContext) -> Result<Recipe, IngestError> {
        let simplified = context.reader_html().ok_or_else(|| {
            IngestError::Extraction("no article content from readability".to_string())
        })?;
        let document = Html::parse_document(simplified);
        let scrape = scrape_document(&document);
        if scrape.ingredients.is_empty() && scrape.steps.is_empty() {
            return Err(IngestError::Extraction(
                "no recipe-shaped markup in simplified article".to_string(),
            ));
        }
        recipe_from_scrape(
            &scrape,
            &context.url,
            "extracted by dom heuristics over readability output",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparseable_url_yields_none() {
        assert!(simplify_html("<html><body><p>hi</p></body></html>", "not a url").is_none());
    }
}
