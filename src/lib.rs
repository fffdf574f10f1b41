//! Sitewatch: a change monitor for web pages and PDF documents
//!
//! This crate re-fetches tracked sites, normalizes what it gets back into text,
//! and keeps only the versions whose checksum differs from the last stored one.
//! Every site carries a monitoring status driven by the outcome of its crawls.

pub mod config;
pub mod crawler;
pub mod output;
pub mod site;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Sitewatch operations
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("Invalid transition: event {event} is not allowed from status {from}")]
    InvalidTransition {
        from: state::SiteStatus,
        event: state::SiteEvent,
    },

    #[error("Crawl task failed: {0}")]
    Task(String),

    #[error("HTTP client error: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// Network-level failures reaching a site
///
/// HTTP error statuses are not fetch errors: a 404 page is content like any other.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },
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

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sitewatch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlReport};
pub use site::{NewSite, Site, SiteVersion};
pub use state::{SiteEvent, SiteStatus};
