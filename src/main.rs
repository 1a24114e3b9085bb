use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use err_news::config::Config;
use err_news::db::Database;
use err_news::fetcher::{start_polling, Fetcher};
use err_news::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "err_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("NEWS_CONFIG").unwrap_or_else(|_| "news.toml".to_string());
    let config = Config::load_or_default(&config_path)?;
    info!(
        "Loaded configuration from {} (refresh every {}s)",
        config_path, config.refresh_interval
    );

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:err_news.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let bind = config.bind.clone();
    let refresh_interval = Duration::from_secs(config.refresh_interval);

    let fetcher = Arc::new(Fetcher::new(Arc::new(db), config).await?);

    // Polling stops when the handle goes out of scope
    let _poller = start_polling(fetcher.clone(), refresh_interval);

    let app = routes::app(Arc::new(AppState { fetcher }));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Server starting on http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
