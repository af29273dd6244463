//! Sitemap differ: decides which of a site's pages need fetching
//!
//! One call handles one site pass. It fetches the site's sitemap,
//! fails the whole pass on transport or decode trouble or on an empty
//! sitemap, makes sure the site's storage directory exists, and emits
//! a work item for every entry that is missing locally or newer than
//! the stored baseline.

use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::queue::PageJob;
use crate::store::PageStore;
use crate::ScrapeError;

/// One sitemap entry as published by a site
///
/// Unknown fields (title, synopsis, and whatever else a site adds) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SitemapEntry {
    /// Page identifier within the site
    pub slug: String,
    /// Last-modified time, epoch milliseconds
    pub date: u64,
}

/// Per-site sitemap pass over a shared HTTP client and page store
pub struct SitemapDiffer {
    client: Client,
    store: Arc<PageStore>,
}

impl SitemapDiffer {
    pub fn new(client: Client, store: Arc<PageStore>) -> Self {
        Self { client, store }
    }

    /// Runs one sitemap pass for `site`
    ///
    /// Returns a page job for every sitemap entry that is absent from
    /// the store or strictly newer than the stored baseline, in
    /// sitemap order. Fails without creating the site's directory when
    /// the sitemap cannot be fetched or decoded, or when it lists zero
    /// pages.
    pub async fn diff(&self, site: &str) -> crate::Result<Vec<PageJob>> {
        let url = format!("http://{site}/system/sitemap.json");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ScrapeError::fetch(&url, e))?;
        let entries: Vec<SitemapEntry> = response
            .json()
            .await
            .map_err(|e| ScrapeError::fetch(&url, e))?;

        if entries.is_empty() {
            return Err(ScrapeError::EmptySitemap(site.to_string()));
        }

        // First contact with a live site: its directory must exist
        // before any of its pages can be stored.
        self.store.ensure_site_dir(site)?;

        let mut jobs = Vec::new();
        for entry in entries {
            let stored = self.store.modified_secs(site, &entry.slug)?;
            if is_stale(stored, entry.date) {
                jobs.push(PageJob {
                    site: site.to_string(),
                    slug: entry.slug,
                    date: entry.date,
                });
            } else {
                tracing::debug!(
                    "Skipping {}/{} (unchanged since {})",
                    site,
                    entry.slug,
                    fmt_epoch_ms(entry.date)
                );
            }
        }
        Ok(jobs)
    }
}

/// True when a page must be (re)fetched
///
/// A page is stale when it was never stored, or when the sitemap date
/// (milliseconds) is strictly greater than the stored baseline
/// (seconds) scaled to milliseconds. The scaling mirrors how the
/// baseline is persisted; equal timestamps count as fresh.
pub(crate) fn is_stale(stored_secs: Option<u64>, date_ms: u64) -> bool {
    match stored_secs {
        None => true,
        Some(secs) => date_ms > secs.saturating_mul(1000),
    }
}

/// Renders an epoch-millisecond stamp for log lines
fn fmt_epoch_ms(ms: u64) -> String {
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| format!("{ms} ms"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::build_http_client;
    use std::time::Duration;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn site_of(server: &MockServer) -> String {
        let uri = url::Url::parse(&server.uri()).unwrap();
        format!("{}:{}", uri.host_str().unwrap(), uri.port().unwrap())
    }

    fn differ_over(store: PageStore) -> SitemapDiffer {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        SitemapDiffer::new(client, Arc::new(store))
    }

    #[test]
    fn never_stored_pages_are_stale() {
        assert!(is_stale(None, 0));
        assert!(is_stale(None, 1_000_000));
    }

    #[test]
    fn staleness_boundary_is_strict() {
        // Stored baseline of 1000 seconds covers up to 1_000_000 ms
        assert!(!is_stale(Some(1000), 999_999));
        assert!(!is_stale(Some(1000), 1_000_000));
        assert!(is_stale(Some(1000), 1_000_001));
    }

    #[test]
    fn sub_second_sitemap_precision_forces_a_refetch() {
        // The baseline only keeps whole seconds, so a date inside the
        // truncated second still reads as newer.
        assert!(is_stale(Some(1), 1999));
    }

    #[tokio::test]
    async fn diff_emits_jobs_for_missing_and_stale_pages_only() {
        let server = MockServer::start().await;
        let site = site_of(&server);
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());
        store.ensure_site_dir(&site).unwrap();
        store.write_page(&site, "stale", &[], 1_000_000).unwrap();
        store.write_page(&site, "fresh", &[], 2_000_000).unwrap();

        Mock::given(method("GET"))
            .and(path("/system/sitemap.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "slug": "missing", "date": 500_000, "title": "Missing" },
                { "slug": "stale", "date": 1_500_000 },
                { "slug": "fresh", "date": 2_000_000 }
            ])))
            .mount(&server)
            .await;

        let differ = differ_over(store);
        let jobs = differ.diff(&site).await.unwrap();

        let slugs: Vec<&str> = jobs.iter().map(|j| j.slug.as_str()).collect();
        assert_eq!(slugs, vec!["missing", "stale"]);
        assert_eq!(jobs[0].date, 500_000);
        assert_eq!(jobs[1].site, site);
    }

    #[tokio::test]
    async fn empty_sitemap_fails_without_creating_the_site_dir() {
        let server = MockServer::start().await;
        let site = site_of(&server);
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        Mock::given(method("GET"))
            .and(path("/system/sitemap.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let differ = differ_over(store.clone());
        let err = differ.diff(&site).await.unwrap_err();

        assert!(matches!(err, ScrapeError::EmptySitemap(s) if s == site));
        assert!(!store.site_dir(&site).exists());
    }

    #[tokio::test]
    async fn http_error_fails_the_pass_without_creating_the_site_dir() {
        let server = MockServer::start().await;
        let site = site_of(&server);
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        Mock::given(method("GET"))
            .and(path("/system/sitemap.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let differ = differ_over(store.clone());
        let err = differ.diff(&site).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { .. }));
        assert!(!store.site_dir(&site).exists());
    }

    #[tokio::test]
    async fn undecodable_sitemap_fails_the_pass() {
        let server = MockServer::start().await;
        let site = site_of(&server);
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        Mock::given(method("GET"))
            .and(path("/system/sitemap.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let differ = differ_over(store);
        let err = differ.diff(&site).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch { .. }));
    }

    #[tokio::test]
    async fn second_pass_over_unchanged_sitemap_emits_nothing() {
        let server = MockServer::start().await;
        let site = site_of(&server);
        let tmp = tempdir().unwrap();
        let store = PageStore::new(tmp.path());

        Mock::given(method("GET"))
            .and(path("/system/sitemap.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "slug": "welcome", "date": 1_000_000 }
            ])))
            .mount(&server)
            .await;

        let differ = differ_over(store.clone());
        let first = differ.diff(&site).await.unwrap();
        assert_eq!(first.len(), 1);

        // Simulate the page loop completing the job
        store.write_page(&site, "welcome", &[], 1_000_000).unwrap();

        let second = differ.diff(&site).await.unwrap();
        assert!(second.is_empty());
    }
}
