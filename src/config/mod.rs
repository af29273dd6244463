//! Configuration module for fedscrape
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use fedscrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("fedscrape.toml")).unwrap();
//! println!("Crawl starts from: {}", config.crawler.root_site);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DEFAULT_DATA_DIR, DEFAULT_ROOT_SITE};

// Re-export parser functions
pub use parser::load_config;

// Re-exported so CLI overrides can be revalidated after they are applied
pub use validation::validate;
