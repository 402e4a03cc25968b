use recipes_api::{config, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, RECIPES_STORE, etc.
    let _ = dotenvy::dotenv();

    logging::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Recipes API in {:?} mode with {:?} store", config.environment, config.store);

    server::serve(config).await
}
