use anyhow::{Context, Result};
use tracing::info;
use chat_translator::{config, ApiClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("languages=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::from_env()?;
    info!("Fetching language catalog from {}", config.api_base());

    let client = ApiClient::from_config(&config)?;
    let catalog = client
        .fetch_languages()
        .await
        .context("Language catalog request failed")?;

    for language in catalog.iter() {
        println!("{}\t{}", language.code, language.name);
    }

    info!("✓ {} languages", catalog.len());
    Ok(())
}
