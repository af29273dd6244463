use crate::config::types::{Config, CrawlerConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_site(&config.root_site)?;

    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data-dir cannot be empty".to_string(),
        ));
    }

    if config.site_poll_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "site-poll-ms must be >= 1, got {}",
            config.site_poll_ms
        )));
    }

    if config.page_poll_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "page-poll-ms must be >= 1, got {}",
            config.page_poll_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates a site identifier (a hostname with an optional port)
///
/// Sites discovered during the crawl are taken as-is from page
/// content; this check only guards the configured root site against
/// obvious typos such as a pasted URL. Hosts are DNS-style names or
/// IPv4 literals; bracketed IPv6 literals are not supported.
fn validate_site(site: &str) -> Result<(), ConfigError> {
    if site.is_empty() {
        return Err(ConfigError::Validation(
            "root-site cannot be empty".to_string(),
        ));
    }

    // Split off an optional :port suffix
    let host = match site.rsplit_once(':') {
        Some((host, port)) => {
            if port.is_empty() || port.parse::<u16>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "root-site '{}' has an invalid port",
                    site
                )));
            }
            host
        }
        None => site,
    };

    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "root-site '{}' has an empty host",
            site
        )));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "root-site '{}' contains invalid characters",
            site
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "root-site '{}' cannot start or end with '.' or '-'",
            site
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "root-site '{}' cannot contain consecutive dots",
            site
        )));
    }

    Ok(())
}
