//! jobwatch CLI
//!
//! Watches career pages listed in `config.json` and sends a Telegram message
//! for every new job posting.

use std::path::Path;

use clap::Parser;
use jobwatch::{error::Result, models::Config, pipeline};

/// Configuration file read from (and written to) the working directory.
const CONFIG_PATH: &str = "config.json";

/// jobwatch - Career Page Monitor
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Watches company career pages and notifies about new job postings"
)]
struct Cli {
    /// Write a sample config.json and exit
    #[arg(long, conflicts_with = "once")]
    init: bool,

    /// Run a single check cycle and exit
    #[arg(long)]
    once: bool,
}

/// Initialize logging, honoring RUST_LOG.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

/// Write the sample configuration unless a config already exists.
fn write_sample_config(path: &Path) -> Result<()> {
    if Config::write_sample(path)? {
        log::info!(
            "Sample {} created! Edit it with your settings.",
            path.display()
        );
    } else {
        log::warn!(
            "{} already exists, leaving it untouched. Remove it to regenerate.",
            path.display()
        );
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Secrets may live in a .env file next to the config.
    let _ = dotenvy::dotenv();
    init_logging();

    let config_path = Path::new(CONFIG_PATH);
    if cli.init {
        return write_sample_config(config_path);
    }

    let mut config = Config::load_or_default(config_path)?;
    config.apply_env()?;
    config.validate()?;

    if config.sources.is_empty() {
        log::warn!("No sources configured. Run with --init to create a sample config.");
    }
    log::info!("Loaded {} sources", config.sources.len());

    let mut monitor = pipeline::Monitor::from_config(&config).await?;

    if cli.once {
        monitor.run_once().await?;
    } else {
        pipeline::run_forever(&mut monitor, config.check_interval()).await;
    }

    Ok(())
}
