//! Saramin Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use saramin_crawler::{
    browser::ChromeSession,
    error::Result,
    models::Config,
    pipeline,
    services::MistralOcr,
    storage::SqliteStore,
};

/// Saramin job-posting crawler
#[derive(Parser, Debug)]
#[command(name = "saramin-crawler", version, about = "Saramin Job Posting Crawler")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl listing pages and collect new postings
    Crawl {
        /// First listing page (overrides config)
        #[arg(long)]
        start_page: Option<u32>,

        /// Last listing page (overrides config)
        #[arg(long)]
        end_page: Option<u32>,

        /// Run the browser headless (overrides config)
        #[arg(long)]
        headless: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show store and configuration info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Saramin crawler starting...");

    let mut config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Crawl {
            start_page,
            end_page,
            headless,
        } => {
            if let Some(start) = start_page {
                config.crawler.start_page = start;
            }
            if let Some(end) = end_page {
                config.crawler.end_page = end;
            }
            if headless {
                config.crawler.headless = true;
            }
            config.validate()?;

            let store = SqliteStore::open(&config.storage.db_path)?;
            let ocr = MistralOcr::from_env(&config.ocr)?;
            let session = ChromeSession::launch(&config.crawler)?;

            let outcome = pipeline::run_crawler(&config, session, &store, &ocr).await;

            log::info!(
                "Crawl complete: {} new posting(s) collected",
                outcome.postings.len()
            );
            if outcome.halted_early {
                log::info!("Run halted early after consecutive duplicate pages.");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Site origin: {}", config.site.origin);
            log::info!(
                "Page range: {} to {}",
                config.crawler.start_page,
                config.crawler.end_page
            );
            log::info!("Database: {}", config.storage.db_path);

            if std::path::Path::new(&config.storage.db_path).exists() {
                let store = SqliteStore::open(&config.storage.db_path)?;
                log::info!("Stored postings: {}", store.count()?);
            } else {
                log::info!("No database yet.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
