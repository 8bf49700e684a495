use thiserror::Error;

/// Errors that can occur while ingesting a recipe page
#[derive(Error, Debug)]
pub enum IngestError {
    /// Failed to fetch the page
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The page fetch returned a non-success status
    #[error("Fetch returned HTTP status {0}")]
    HttpStatus(u16),

    /// A normalized candidate failed Recipe validation
    #[error("Recipe validation failed: {0}")]
    Validation(String),

    /// A strategy could not produce a candidate from this page
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Every strategy was exhausted without a structurally complete recipe
    #[error("No recipe could be extracted from this webpage")]
    NoRecipe,

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
