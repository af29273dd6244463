//! Fedscrape main entry point
//!
//! This is the command-line interface for the fedscrape federation crawler.

use clap::Parser;
use fedscrape::config::{load_config, validate, Config};
use fedscrape::crawler::crawl;
use fedscrape::store::PageStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fedscrape: an incremental federated wiki crawler
///
/// Fedscrape walks a federation of wiki sites: it diffs each site's
/// sitemap against the pages already fetched, fetches only pages that
/// changed, and follows site references found in page content to
/// discover the rest of the federation.
#[derive(Parser, Debug)]
#[command(name = "fedscrape")]
#[command(version)]
#[command(about = "An incremental federated wiki crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed this site instead of the configured root site
    #[arg(long, value_name = "HOST")]
    root_site: Option<String>,

    /// Store fetched pages under this directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Validate config and show the seed plan without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load the configuration, or fall back to the defaults
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config(path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    // Apply command-line overrides, then re-validate
    if let Some(root_site) = cli.root_site {
        config.crawler.root_site = root_site;
    }
    if let Some(data_dir) = cli.data_dir {
        config.crawler.data_dir = data_dir;
    }
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fedscrape=info,warn"),
            1 => EnvFilter::new("fedscrape=debug,info"),
            2 => EnvFilter::new("fedscrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the seed plan
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Fedscrape Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root site: {}", config.crawler.root_site);
    println!("  Data dir: {}", config.crawler.data_dir);
    println!("  Site poll: {}ms", config.crawler.site_poll_ms);
    println!("  Page poll: {}ms", config.crawler.page_poll_ms);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );
    println!();

    // Peek at the data dir without creating it
    let store = PageStore::new(&config.crawler.data_dir);
    let known = if store.root().exists() {
        store.bootstrap()?
    } else {
        Vec::new()
    };

    if known.is_empty() {
        println!(
            "Seed plan: start from root site {}",
            config.crawler.root_site
        );
    } else {
        println!("Known sites ({}):", known.len());
        for site in &known {
            println!("  - {}", site);
        }
        println!("\nSeed plan: re-queue the {} known sites", known.len());
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl (root site: {}, data dir: {})",
        config.crawler.root_site,
        config.crawler.data_dir
    );

    // The crawl loops never finish on their own; an Err here means
    // startup failed before the loops began.
    match crawl(config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
