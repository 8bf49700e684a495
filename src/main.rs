use std::env;

use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let url = args.get(1).ok_or("Please provide a URL as an argument")?;

    let extraction = recipe_ingest::extract_recipe(url).await?;
    info!(
        "extracted via {} (enriched: {})",
        extraction.strategy, extraction.enriched
    );

    println!("{}", serde_json::to_string_pretty(&extraction)?);

    Ok(())
}
