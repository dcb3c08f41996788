use stock_sage::{api::start_server, config::Config, session::Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    if config.api_key.is_none() && !config.offline {
        eprintln!("⚠️  PERPLEXITY_API_KEY not set; falling back to the stored key");
        eprintln!("📌 PUT /api/credential to configure one");
    }

    info!("🚀 Stock Sage - API Server");
    info!("📍 Port: {}", config.port);

    let session = Session::start(&config).await?;

    info!("✅ Session initialized");
    info!("📡 Starting API server...");

    start_server(session, config.port).await?;

    Ok(())
}
