//! Scheduler for driving the crawl loops
//!
//! This module wires the crawl together:
//! - Bootstraps the page store and seeds the site frontier
//! - Runs the site loop (one sitemap pass per queued site)
//! - Runs the page loop (one page fetch per queued job)
//! - Feeds sites discovered in pages back into the frontier
//!
//! Both loops run forever on a single cooperative task: they only
//! interleave at await points, so every queue and registry mutation
//! completes without interference, and at most one request per loop is
//! in flight at any moment.

use std::sync::Arc;
use std::time::Duration;

use super::differ::SitemapDiffer;
use super::fetcher::{build_http_client, PageFetcher};
use super::frontier::SiteFrontier;
use super::queue::{PageJob, WorkQueue};
use crate::config::Config;
use crate::step::{FreeRun, StepControl};
use crate::store::PageStore;

/// Two-loop crawl engine over one site frontier and one page queue
///
/// The scheduler coordinates:
/// - Site passes: frontier -> sitemap diff -> page queue
/// - Page fetches: page queue -> extraction -> frontier
/// - Step gates announcing each unit of work before it runs
pub struct Scheduler {
    frontier: Arc<SiteFrontier>,
    pages: Arc<WorkQueue<PageJob>>,
    store: Arc<PageStore>,
    differ: SitemapDiffer,
    fetcher: PageFetcher,
    site_gate: Arc<dyn StepControl>,
    page_gate: Arc<dyn StepControl>,
    site_poll: Duration,
    page_poll: Duration,
}

impl Scheduler {
    /// Creates a free-running scheduler from the configuration
    ///
    /// Bootstraps the data directory and seeds the frontier: every
    /// site already stored on disk is queued again, and a store with
    /// no sites at all starts from the configured root site.
    pub fn new(config: &Config) -> crate::Result<Self> {
        Self::with_gates(config, Arc::new(FreeRun), Arc::new(FreeRun))
    }

    /// Creates a scheduler whose loops report to the given step gates
    pub fn with_gates(
        config: &Config,
        site_gate: Arc<dyn StepControl>,
        page_gate: Arc<dyn StepControl>,
    ) -> crate::Result<Self> {
        let store = Arc::new(PageStore::new(&config.crawler.data_dir));
        let frontier = Arc::new(SiteFrontier::new());

        let known = store.bootstrap()?;
        if known.is_empty() {
            tracing::info!("Cold start, seeding root site {}", config.crawler.root_site);
            frontier.discover(&[config.crawler.root_site.clone()]);
        } else {
            tracing::info!(
                "Re-seeding {} known sites from {}",
                known.len(),
                store.root().display()
            );
            frontier.discover(&known);
        }

        let client = build_http_client(config.crawler.request_timeout())?;

        Ok(Self {
            frontier: Arc::clone(&frontier),
            pages: Arc::new(WorkQueue::new()),
            store: Arc::clone(&store),
            differ: SitemapDiffer::new(client.clone(), Arc::clone(&store)),
            fetcher: PageFetcher::new(client, store),
            site_gate,
            page_gate,
            site_poll: config.crawler.site_poll(),
            page_poll: config.crawler.page_poll(),
        })
    }

    /// The shared site frontier, for observing crawl progress
    pub fn frontier(&self) -> Arc<SiteFrontier> {
        Arc::clone(&self.frontier)
    }

    /// The shared page queue, for observing crawl progress
    pub fn pages(&self) -> Arc<WorkQueue<PageJob>> {
        Arc::clone(&self.pages)
    }

    /// The shared page store
    pub fn store(&self) -> Arc<PageStore> {
        Arc::clone(&self.store)
    }

    /// Drives both crawl loops until the process is terminated
    pub async fn run(self) {
        tokio::join!(self.site_loop(), self.page_loop());
    }

    /// Site-level consumer: one sitemap pass per queued site
    ///
    /// A failed pass is logged and the site still moves to done; it
    /// will not be retried this run.
    async fn site_loop(&self) {
        tracing::info!("Site loop started");
        let mut count: u64 = 0;
        loop {
            let site = self.frontier.take_next(self.site_poll).await;
            self.site_gate.step(&format!("#{} {}", count, site)).await;
            count += 1;

            match self.differ.diff(&site).await {
                Ok(jobs) => {
                    tracing::info!("Sitemap pass for {}: {} pages to fetch", site, jobs.len());
                    for job in jobs {
                        self.pages.push(job);
                    }
                }
                Err(e) => {
                    tracing::warn!("Sitemap pass for {} failed: {}", site, e);
                }
            }
            self.frontier.mark_done(&site);
            tokio::time::sleep(self.site_poll).await;
        }
    }

    /// Page-level consumer: one fetch per queued page job
    ///
    /// A failed fetch is logged and dropped; the page stays unstored,
    /// so a later sitemap pass would emit it again.
    async fn page_loop(&self) {
        tracing::info!("Page loop started");
        let mut count: u64 = 0;
        loop {
            let job = self.pages.pop_next(self.page_poll).await;
            self.page_gate
                .step(&format!("#{} {}", count, job.slug))
                .await;
            count += 1;

            match self.fetcher.fetch_and_extract(&job).await {
                Ok(sites) => {
                    let added = self.frontier.discover(&sites);
                    tracing::debug!(
                        "Page {}/{} referenced {} sites ({} new)",
                        job.site,
                        job.slug,
                        sites.len(),
                        added
                    );
                }
                Err(e) => {
                    tracing::warn!("Page fetch for {}/{} failed: {}", job.site, job.slug, e);
                }
            }
            tokio::time::sleep(self.page_poll).await;
        }
    }
}
