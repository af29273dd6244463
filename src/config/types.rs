use serde::Deserialize;
use std::time::Duration;

/// Site seeded on a cold start, before any site has been stored
pub const DEFAULT_ROOT_SITE: &str = "sites.asia.wiki.org";

/// Default on-disk location of fetched pages
pub const DEFAULT_DATA_DIR: &str = "data";

/// Main configuration structure for fedscrape
///
/// Every field has a default, so a missing config file (or an empty
/// one) yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site seeded when the data directory holds no known sites
    #[serde(rename = "root-site")]
    pub root_site: String,

    /// Directory where fetched pages are stored
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Site loop pacing and queue-poll interval (milliseconds)
    #[serde(rename = "site-poll-ms")]
    pub site_poll_ms: u64,

    /// Page loop pacing and queue-poll interval (milliseconds)
    #[serde(rename = "page-poll-ms")]
    pub page_poll_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_site: DEFAULT_ROOT_SITE.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            site_poll_ms: 1000,
            page_poll_ms: 100,
            request_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    /// Site loop interval as a `Duration`
    pub fn site_poll(&self) -> Duration {
        Duration::from_millis(self.site_poll_ms)
    }

    /// Page loop interval as a `Duration`
    pub fn page_poll(&self) -> Duration {
        Duration::from_millis(self.page_poll_ms)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
