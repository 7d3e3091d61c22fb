//! Command line entry point: load configuration, launch the browser
//! session, and drive the extraction run.

use clap::Parser;
use propflow_browser::{ChromiumSession, LaunchOptions};
use propflow_core::AppConfig;
use propflow_scraper::SessionOrchestrator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "propflow", version)]
#[command(about = "Scrape saved property searches into a single JSON document")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "propflow.toml")]
    config: PathBuf,

    /// Cap on rows scraped per saved search
    #[arg(long)]
    max_rows: Option<usize>,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_with_env(&cli.config)?;
    if let Some(cap) = cli.max_rows {
        config.run.max_rows = Some(cap);
    }
    if cli.headed {
        config.browser.headless = false;
    }
    config.validate()?;
    let credentials = config.credentials()?;

    let options = LaunchOptions {
        headless: config.browser.headless,
        window_width: config.browser.window_width,
        window_height: config.browser.window_height,
    };
    let session = ChromiumSession::launch(&options).await?;

    let orchestrator = SessionOrchestrator::new(Arc::new(session), config, credentials);
    let aggregate = orchestrator.run().await?;

    println!(
        "{} records scraped: {} ok, {} failed",
        aggregate.len(),
        aggregate.successes(),
        aggregate.failures()
    );
    Ok(())
}
