use serde::Deserialize;

/// Main configuration structure for Sitewatch
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteEntry>,
}

/// HTTP fetch limits
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Upper bound on a whole request, body included (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on establishing the connection (seconds)
    #[serde(
        rename = "connect-timeout-secs",
        default = "default_connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the watcher
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the watcher
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the watcher
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for watcher-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Crawl scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of sites crawled at the same time
    #[serde(
        rename = "max-concurrent-crawls",
        default = "default_max_concurrent_crawls"
    )]
    pub max_concurrent_crawls: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: default_max_concurrent_crawls(),
        }
    }
}

fn default_max_concurrent_crawls() -> u32 {
    8
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A site to register on startup
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    pub name: String,
    pub url: String,
}
