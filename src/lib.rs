//! Multi-strategy recipe extraction from web pages.
//!
//! Raw HTML goes in, a validated, normalized [`Recipe`] record comes out.
//! The pipeline cascades over structured-data extractors (JSON-LD,
//! microdata), DOM heuristics, a readability fallback and an LLM-assisted
//! last resort, short-circuiting on the first structurally complete
//! result.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), recipe_ingest::IngestError> {
//! let extraction = recipe_ingest::extract_recipe("https://example.com/recipe").await?;
//! println!("{} via {}", extraction.recipe.title.as_deref().unwrap_or("?"), extraction.strategy);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod providers;

pub use error::IngestError;
pub use extract::Strategy;
pub use model::{DietFlags, Ingredient, Recipe, RecipeTimes, RecipeYield, Step, UnitSystem};
pub use pipeline::{Extraction, Ingestor, IngestorBuilder, ProviderKind};

/// Fetch a URL and extract its recipe with a default pipeline. LLM
/// strategies are active when configuration or environment provides an
/// API key; otherwise the document strategies run alone.
pub async fn extract_recipe(url: &str) -> Result<Extraction, IngestError> {
    Ingestor::builder().build()?.extract_from_url(url).await
}

/// Extract a recipe from already-fetched HTML
pub async fn extract_recipe_from_html(html: &str, url: &str) -> Result<Extraction, IngestError> {
    Ingestor::builder().build()?.extract_from_html(html, url).await
}
