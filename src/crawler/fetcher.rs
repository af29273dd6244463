//! Page fetcher and site-reference extraction
//!
//! One call handles one page job: fetch the page document, pull every
//! distinct site referenced from its story and journal, persist that
//! list under the sitemap-declared timestamp, and hand the list back
//! so the frontier can grow.

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::queue::PageJob;
use super::Site;
use crate::store::PageStore;
use crate::ScrapeError;

/// A wiki page document, reduced to the parts that can reference sites
///
/// Story items and journal actions both may carry a `site` field;
/// everything else in the document is irrelevant to the crawl and
/// dropped during decoding. Both collections tolerate being absent or
/// null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub story: Option<Vec<PageItem>>,
    #[serde(default)]
    pub journal: Option<Vec<PageItem>>,
}

/// One story item or journal action
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageItem {
    /// Referenced site, present when the item points at a remote page
    #[serde(default)]
    pub site: Option<Site>,
}

/// Builds the HTTP client shared by the sitemap differ and page fetcher
///
/// # Arguments
///
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    // Format: fedscrape/<version>
    let user_agent = concat!("fedscrape/", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches page documents and records the sites they reference
pub struct PageFetcher {
    client: Client,
    store: Arc<PageStore>,
}

impl PageFetcher {
    pub fn new(client: Client, store: Arc<PageStore>) -> Self {
        Self { client, store }
    }

    /// Fetches one page and returns the sites it references
    ///
    /// The extracted list (possibly empty) is persisted at the page's
    /// path with the job's sitemap date as its baseline before the
    /// list is returned. On transport or decode failure nothing is
    /// stored, so the page stays eligible for a future sitemap pass.
    pub async fn fetch_and_extract(&self, job: &PageJob) -> crate::Result<Vec<Site>> {
        let url = format!("http://{}/{}.json", job.site, job.slug);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ScrapeError::fetch(&url, e))?;
        let page: PageDocument = response
            .json()
            .await
            .map_err(|e| ScrapeError::fetch(&url, e))?;

        let sites = extract_site_refs(&page);
        self.store
            .write_page(&job.site, &job.slug, &sites, job.date)?;
        Ok(sites)
    }
}

/// Collects every distinct site referenced by a page
///
/// Story items are scanned before journal actions. The first
/// occurrence fixes a site's position in the result and repeats are
/// dropped, as are items without a site and empty site fields.
pub fn extract_site_refs(page: &PageDocument) -> Vec<Site> {
    let mut sites: Vec<Site> = Vec::new();
    let story = page.story.iter().flatten();
    let journal = page.journal.iter().flatten();
    for item in story.chain(journal) {
        if let Some(site) = &item.site {
            if !site.is_empty() && !sites.contains(site) {
                sites.push(site.clone());
            }
        }
    }
    sites
}
