//! Fedscrape: an incremental crawler for federated wiki sites
//!
//! A federation is a loose network of wiki sites whose pages reference
//! pages on other sites. Every site publishes a sitemap listing its
//! pages with last-modified timestamps; every page is a JSON document
//! whose story and journal items may name further sites.
//!
//! Fedscrape walks that graph incrementally: it diffs each site's
//! sitemap against the pages already on disk, fetches only pages that
//! are missing or newer, stores the sites each page references, and
//! feeds newly referenced sites back into the crawl frontier.

pub mod config;
pub mod crawler;
pub mod step;
pub mod store;

use thiserror::Error;

/// Main error type for fedscrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("Empty sitemap for site '{0}'")]
    EmptySitemap(String),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ScrapeError {
    /// Wraps a transport or decode failure with the URL that produced it
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for fedscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, PageJob, Scheduler, Site, SiteFrontier, SiteState, Slug};
pub use step::{FreeRun, StepControl, StepController};
pub use store::PageStore;
