//! Crawler module for change detection
//!
//! This module contains the crawl-and-diff engine:
//! - HTTP fetching with a bounded timeout
//! - Normalization of HTML and PDF content to text
//! - Checksums of normalized content
//! - Per-site crawl orchestration and the status transitions it drives
//! - Parallel crawling of many sites

pub mod checksum;
mod coordinator;
mod fetcher;
pub mod normalize;
mod scheduler;

pub use checksum::digest;
pub use coordinator::{CrawlOrchestrator, CrawlReport, StatusChange};
pub use fetcher::{build_http_client, ContentFetcher, FetchedContent};
pub use normalize::{normalize, EXTRACTION_FAILED};
pub use scheduler::{crawl_all, BatchSummary, SiteCrawlResult};

use crate::config::Config;
use crate::storage::{register_sites, SqliteStorage};
use crate::WatchError;
use std::path::Path;
use std::sync::Arc;

/// Crawls every registered site once
///
/// This is the main entry point for a scheduled run. It will:
/// 1. Open the storage layer
/// 2. Register the sites listed in the configuration
/// 3. Fail any site a previous process left mid-crawl
/// 4. Crawl all sites in parallel
///
/// # Arguments
///
/// * `config` - The watcher configuration
///
/// # Returns
///
/// * `Ok(BatchSummary)` - Every site was attempted; individual failures are counted
/// * `Err(WatchError)` - The run could not start
pub async fn crawl(config: &Config) -> Result<BatchSummary, WatchError> {
    let orchestrator = Arc::new(open_orchestrator(config)?);
    orchestrator.recover_interrupted().await?;

    let site_ids = orchestrator.site_ids()?;

    let results = crawl_all(
        orchestrator,
        site_ids,
        config.crawler.max_concurrent_crawls as usize,
    )
    .await;

    Ok(BatchSummary::from_results(&results))
}

/// Opens storage, registers the configured sites and builds an orchestrator
pub fn open_orchestrator(config: &Config) -> Result<CrawlOrchestrator<SqliteStorage>, WatchError> {
    let mut storage = SqliteStorage::new(Path::new(&config.storage.database_path))?;
    register_sites(&mut storage, &config.sites)?;

    let fetcher = ContentFetcher::from_config(&config.fetcher, &config.user_agent)
        .map_err(WatchError::ClientBuild)?;

    Ok(CrawlOrchestrator::new(storage, fetcher))
}
