use scraper::Html;
use serde::Serialize;

use crate::error::IngestError;
use crate::model::Recipe;

mod heuristics;
mod json_ld;
mod microdata;
mod reader;

pub use self::heuristics::{scrape_document, HeuristicsExtractor};
pub use self::json_ld::JsonLdExtractor;
pub use self::microdata::MicrodataExtractor;
pub use self::reader::{simplify_html, ReaderExtractor};

/// Which extraction-and-normalization path produced a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    JsonLd,
    Microdata,
    Heuristics,
    ReadabilityHeuristics,
    LlmFallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::JsonLd => "json-ld",
            Strategy::Microdata => "microdata",
            Strategy::Heuristics => "heuristics",
            Strategy::ReadabilityHeuristics => "readability-heuristics",
            Strategy::LlmFallback => "llm-fallback",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared input for the document-level strategies. The readability pass
/// is computed at most once per request and memoized here.
pub struct ParsingContext {
    pub url: String,
    pub html: String,
    pub document: Html,
    reader_html: once_cell::unsync::OnceCell<Option<String>>,
}

impl ParsingContext {
    pub fn new(url: &str, html: &str) -> Self {
        ParsingContext {
            url: url.to_string(),
            html: html.to_string(),
            document: Html::parse_document(html),
            reader_html: once_cell::unsync::OnceCell::new(),
        }
    }

    /// Simplified article HTML from the readability provider, or None
    /// when the page has no extractable article content.
    pub fn reader_html(&self) -> Option<&str> {
        self.reader_html
            .get_or_init(|| simplify_html(&self.html, &self.url))
            .as_deref()
    }
}

/// One extraction strategy. Strategies never mutate each other's output;
/// the orchestrator folds over them in priority order.
pub trait Extractor {
    fn strategy(&self) -> Strategy;
    fn extract(&self, context: &ParsingContext) -> Result<Recipe, IngestError>;
}

/// The document-level cascade, in priority order. LLM fallback runs
/// separately because it suspends on network I/O.
pub fn document_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(JsonLdExtractor),
        Box::new(MicrodataExtractor),
        Box::new(HeuristicsExtractor),
        Box::new(ReaderExtractor),
    ]
}
