//! Scheduler for crawling many sites at once
//!
//! Each site is an independent unit of work. A semaphore bounds how many
//! crawls are in flight; the orchestrator's per-site lock keeps a site that
//! appears twice from being crawled concurrently with itself.

use crate::crawler::coordinator::{CrawlOrchestrator, CrawlReport};
use crate::storage::Storage;
use crate::WatchError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of crawling one site in a batch
#[derive(Debug)]
pub struct SiteCrawlResult {
    pub site_id: i64,
    pub result: Result<CrawlReport, WatchError>,
}

/// Tallies of a batch of crawls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[SiteCrawlResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, r| {
            match &r.result {
                Ok(report) if report.changed => summary.changed += 1,
                Ok(_) => summary.unchanged += 1,
                Err(_) => summary.failed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.changed + self.unchanged + self.failed
    }
}

/// Crawls every site in `site_ids` with at most `max_concurrency` in flight
///
/// # Returns
///
/// One result per requested site, in the order the ids were given
pub async fn crawl_all<S>(
    orchestrator: Arc<CrawlOrchestrator<S>>,
    site_ids: Vec<i64>,
    max_concurrency: usize,
) -> Vec<SiteCrawlResult>
where
    S: Storage + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, site_id) in site_ids.iter().copied().enumerate() {
        let orchestrator = Arc::clone(&orchestrator);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            // The semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            let result = orchestrator.crawl(site_id).await;
            (index, SiteCrawlResult { site_id, result })
        });
    }

    let mut slots: Vec<Option<SiteCrawlResult>> = site_ids.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => tracing::error!("Crawl task panicked: {}", e),
        }
    }

    let results: Vec<SiteCrawlResult> = slots
        .into_iter()
        .zip(site_ids)
        .map(|(slot, site_id)| {
            slot.unwrap_or_else(|| SiteCrawlResult {
                site_id,
                result: Err(WatchError::Task("crawl task did not complete".to_string())),
            })
        })
        .collect();

    let summary = BatchSummary::from_results(&results);
    tracing::info!(
        "Crawled {} sites: {} changed, {} unchanged, {} failed",
        summary.total(),
        summary.changed,
        summary.unchanged,
        summary.failed
    );

    results
}
