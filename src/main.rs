use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diplomatic_news::aggregator::Aggregator;
use diplomatic_news::config::Config;
use diplomatic_news::fetcher::HttpFetcher;
use diplomatic_news::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diplomatic_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("FEEDS_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let mut config = Config::load(&config_path)?;
    if let Ok(port) = std::env::var("PORT") {
        config.port = port.parse()?;
    }
    info!(
        "Loaded {} sources from {}",
        config.sources.len(),
        config_path
    );

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?);
    let aggregator = Arc::new(Aggregator::from_config(&config, fetcher));

    let app = routes::app(Arc::new(AppState { aggregator }));

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server starting on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
