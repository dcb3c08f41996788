use stock_sage::{cli, config::Config, session::Session};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Logs go to stderr so the panel output stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let session = Session::start(&config).await?;

    info!(offline = config.offline, "Stock Sage starting");

    println!("Stock Sage Explorer");
    println!("Recent price movements, news and analyst sentiment for popular US stocks.");
    println!("Analysis powered by Perplexity. For educational purposes only.\n");
    if session.credential().is_none() {
        println!("No API key configured. Enter one with: key <your Perplexity API key>");
    }
    println!("Type `help` for commands.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    if let Err(e) = cli::run(&session, stdin, &mut stdout).await {
        eprintln!("Stock Sage failed: {}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error>);
    }

    Ok(())
}
