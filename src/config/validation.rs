use crate::config::types::{
    Config, CrawlerConfig, FetcherConfig, SiteEntry, StorageConfig, UserAgentConfig,
};
use crate::site::{validate_name, validate_site_url};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates fetch timeouts
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and timeout_secs ({}), got {}",
            config.timeout_secs, config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_crawls < 1 || config.max_concurrent_crawls > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_crawls must be between 1 and 100, got {}",
            config.max_concurrent_crawls
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site entries: well-formed and listed once
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in sites {
        validate_name(&entry.name).map_err(ConfigError::Validation)?;
        validate_site_url(&entry.url).map_err(ConfigError::InvalidUrl)?;

        if !seen.insert(entry.url.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Site url '{}' is listed more than once",
                entry.url
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, url: &str) -> SiteEntry {
        SiteEntry {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_validate_sites() {
        assert!(validate_sites(&[]).is_ok());
        assert!(validate_sites(&[
            site("Docs", "https://docs.example.com/"),
            site("Report", "http://example.com/report.pdf"),
        ])
        .is_ok());

        assert!(matches!(
            validate_sites(&[site("", "https://example.com/")]),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            validate_sites(&[site("Ftp", "ftp://example.com/")]),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_sites(&[
                site("A", "https://example.com/"),
                site("B", "https://example.com/"),
            ]),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_fetcher_config() {
        let ok = FetcherConfig {
            timeout_secs: 30,
            connect_timeout_secs: 10,
        };
        assert!(validate_fetcher_config(&ok).is_ok());

        let zero = FetcherConfig {
            timeout_secs: 0,
            connect_timeout_secs: 0,
        };
        assert!(validate_fetcher_config(&zero).is_err());

        let inverted = FetcherConfig {
            timeout_secs: 5,
            connect_timeout_secs: 10,
        };
        assert!(validate_fetcher_config(&inverted).is_err());
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&CrawlerConfig {
            max_concurrent_crawls: 1
        })
        .is_ok());
        assert!(validate_crawler_config(&CrawlerConfig {
            max_concurrent_crawls: 0
        })
        .is_err());
        assert!(validate_crawler_config(&CrawlerConfig {
            max_concurrent_crawls: 101
        })
        .is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }
}
