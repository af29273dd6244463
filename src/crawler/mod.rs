//! Crawler module for incremental federation crawling
//!
//! This module contains the core crawling logic, including:
//! - The site frontier (deduplicated registry of known sites)
//! - Sitemap diffing against the stored baselines
//! - Page fetching and site-reference extraction
//! - The two crawl loops that drive everything

mod differ;
mod fetcher;
mod frontier;
mod queue;
mod scheduler;

pub use differ::{SitemapDiffer, SitemapEntry};
pub use fetcher::{build_http_client, extract_site_refs, PageDocument, PageFetcher, PageItem};
pub use frontier::{SiteFrontier, SiteState};
pub use queue::{PageJob, WorkQueue};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::ScrapeError;

/// A participating wiki host, identified by hostname (with optional port)
pub type Site = String;

/// A page identifier, unique within a site
pub type Slug = String;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Bootstrap the data directory
/// 2. Seed the frontier (stored sites, or the configured root site)
/// 3. Build the HTTP client
/// 4. Drive the site and page loops until the process is terminated
///
/// Individual sitemap and page failures are logged and skipped; only
/// startup problems are returned.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Err(ScrapeError)` - Startup failed; the crawl itself never ends
pub async fn crawl(config: Config) -> Result<(), ScrapeError> {
    let scheduler = Scheduler::new(&config)?;
    scheduler.run().await;
    Ok(())
}
