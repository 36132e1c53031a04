use std::sync::Arc;

use tracing::info;

use feedhub::feed::FeedScheduler;
use feedhub::{Config, Database};

#[tokio::main]
async fn main() -> feedhub::Result<()> {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = feedhub::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        feedhub::logging::init_console_only(&config.logging.level);
    }

    info!("feedhub - RSS/Atom feed aggregation service");

    let db = Arc::new(Database::open(&config.database.path).await?);

    let scheduler = FeedScheduler::new(db, &config.scheduler)?;
    scheduler.run().await;

    Ok(())
}
