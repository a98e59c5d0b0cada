use std::error::Error;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file; a missing file is fine.
    let dotenv = dotenvy::dotenv();

    let filter = ai_llm_service::telemetry::env_filter_with_level("info", Level::INFO);

    tracing_subscriber::registry()
        .with(filter)
        .with(ai_llm_service::telemetry::layer())
        .try_init()?;

    if let Err(err) = dotenv {
        tracing::debug!(error = %err, "no .env loaded");
    }

    if let Err(err) = api::start().await {
        tracing::error!(error = %err, "server exited with error");
        return Err(err.into());
    }

    Ok(())
}
