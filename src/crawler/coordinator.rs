//! Crawl coordinator - change detection for a single site
//!
//! One crawl runs, in order and under the site's lock:
//! 1. Stamp the site's last-crawled time
//! 2. Apply `run`
//! 3. Fetch, normalize and checksum the content
//! 4. Compare against the last stored version's checksum
//! 5. Persist the new version together with `found_diff`, or discard it and apply `no_diff`
//!
//! Any failure after the site is loaded applies `error` instead. The version
//! history is only ever touched by the single append in step 5.

use crate::crawler::checksum::digest;
use crate::crawler::fetcher::ContentFetcher;
use crate::crawler::normalize::{normalize, EXTRACTION_FAILED};
use crate::site::{Site, SiteVersion};
use crate::state::{self, SiteEvent, SiteLocks, SiteStatus};
use crate::storage::{Storage, StorageError, StorageResult};
use crate::WatchError;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Capacity of the status change channel before slow subscribers lag
const NOTIFY_CAPACITY: usize = 256;

/// Outcome of a crawl that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub site_id: i64,

    /// True if a new version was stored
    pub changed: bool,

    /// Status after the crawl
    pub status: SiteStatus,

    /// The version stored by this crawl, if any
    pub version: Option<SiteVersion>,
}

/// Published for every transition a site goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub site_id: i64,
    pub event: SiteEvent,
    pub status: SiteStatus,
}

/// A version computed by a crawl but not yet stored
#[derive(Debug)]
struct PendingVersion {
    body: String,
    status_code: u16,
    checksum: String,
}

impl PendingVersion {
    fn matches(&self, last: Option<&SiteVersion>) -> bool {
        last.is_some_and(|v| v.checksum == self.checksum)
    }
}

/// Main crawl orchestrator
///
/// Cheap to share behind an `Arc`: crawls of different sites run in parallel,
/// crawls of the same site queue on its lock.
pub struct CrawlOrchestrator<S: Storage> {
    storage: Arc<Mutex<S>>,
    fetcher: ContentFetcher,
    locks: SiteLocks,
    notifier: broadcast::Sender<StatusChange>,
}

impl<S: Storage> CrawlOrchestrator<S> {
    /// Creates an orchestrator that owns `storage`
    pub fn new(storage: S, fetcher: ContentFetcher) -> Self {
        Self::with_shared_storage(Arc::new(Mutex::new(storage)), fetcher)
    }

    /// Creates an orchestrator over storage shared with other components
    pub fn with_shared_storage(storage: Arc<Mutex<S>>, fetcher: ContentFetcher) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            storage,
            fetcher,
            locks: SiteLocks::new(),
            notifier,
        }
    }

    /// Returns a handle to the underlying storage
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// Subscribes to status changes
    ///
    /// Diff alerts are the changes whose event is [`SiteEvent::FoundDiff`].
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.notifier.subscribe()
    }

    /// Gets the ids of every registered site
    pub fn site_ids(&self) -> Result<Vec<i64>, WatchError> {
        Ok(self.with_storage(|s| s.list_site_ids())?)
    }

    /// Crawls one site and records the outcome
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl settled on `found_diff` or `no_diff`
    /// * `Err(WatchError::Fetch)` / `Err(WatchError::Persistence)` - The site is now `failed`
    /// * `Err(WatchError::InvalidTransition)` - The site was in a status a crawl
    ///   cannot start from; nothing beyond the timestamp was changed
    pub async fn crawl(&self, site_id: i64) -> Result<CrawlReport, WatchError> {
        let _guard = self.locks.acquire(site_id).await;

        let mut site = self.with_storage(|s| s.load_site(site_id))?;
        tracing::info!("Crawling site {} ({})", site.id, site.url);

        let outcome = self.run_crawl(&mut site).await;
        match outcome {
            Ok(report) => Ok(report),
            Err(e @ WatchError::InvalidTransition { .. }) => {
                tracing::error!("Crawl of site {} rejected: {}", site.id, e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!("Crawl of site {} failed: {}", site.id, e);
                self.mark_failed(&mut site);
                Err(e)
            }
        }
    }

    /// Applies the operator acknowledgment `check` to a site
    pub async fn acknowledge(&self, site_id: i64) -> Result<SiteStatus, WatchError> {
        let _guard = self.locks.acquire(site_id).await;

        let mut site = self.with_storage(|s| s.load_site(site_id))?;
        let status = self.transition(&mut site, SiteEvent::Check)?;
        tracing::info!("Site {} acknowledged", site_id);
        Ok(status)
    }

    /// Fails every site left `running` by a crawl that never finished
    ///
    /// # Returns
    ///
    /// The ids of the sites that were recovered
    pub async fn recover_interrupted(&self) -> Result<Vec<i64>, WatchError> {
        let stuck = self.with_storage(|s| s.sites_in_status(SiteStatus::Running))?;
        let mut recovered = Vec::with_capacity(stuck.len());

        for candidate in stuck {
            let _guard = self.locks.acquire(candidate.id).await;

            // Re-read under the lock; the site may have moved on
            let mut site = self.with_storage(|s| s.load_site(candidate.id))?;
            if site.status != SiteStatus::Running {
                continue;
            }

            tracing::warn!("Site {} was left running; marking failed", site.id);
            self.transition(&mut site, SiteEvent::Error)?;
            recovered.push(site.id);
        }

        Ok(recovered)
    }

    async fn run_crawl(&self, site: &mut Site) -> Result<CrawlReport, WatchError> {
        let site_id = site.id;

        let now = Utc::now();
        self.with_storage(|s| s.update_last_crawled_at(site_id, now))?;
        site.last_crawled_at = Some(now);

        self.transition(site, SiteEvent::Run)?;

        let fetched = self.fetcher.fetch(&site.url).await?;
        let status_code = fetched.status_code;

        let pending = tokio::task::spawn_blocking(move || {
            let body = normalize(&fetched.body, &fetched.content_type);
            let checksum = digest(&body);
            PendingVersion {
                body,
                status_code,
                checksum,
            }
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Normalization task for site {} died: {}", site_id, e);
            PendingVersion {
                body: EXTRACTION_FAILED.to_string(),
                status_code,
                checksum: digest(EXTRACTION_FAILED),
            }
        });

        let last = self.with_storage(|s| s.load_last_version(site_id))?;

        if pending.matches(last.as_ref()) {
            tracing::info!("No change in site {} since last version", site_id);
            let status = self.transition(site, SiteEvent::NoDiff)?;
            return Ok(CrawlReport {
                site_id,
                changed: false,
                status,
                version: None,
            });
        }

        let (status, version) = self.transition_with(site, SiteEvent::FoundDiff, |s, status| {
            s.append_version_with_status(
                site_id,
                &pending.body,
                pending.status_code,
                &pending.checksum,
                status,
            )
        })?;
        tracing::info!(
            "Site {} changed; stored version {} ({})",
            site_id,
            version.id,
            version.checksum
        );

        Ok(CrawlReport {
            site_id,
            changed: true,
            status,
            version: Some(version),
        })
    }

    /// Applies `event`, persists the new status, then publishes it
    fn transition(&self, site: &mut Site, event: SiteEvent) -> Result<SiteStatus, WatchError> {
        let site_id = site.id;
        let (status, ()) =
            self.transition_with(site, event, |s, status| s.update_site_status(site_id, status))?;
        Ok(status)
    }

    /// Like `transition`, with `persist` writing the new status
    ///
    /// On a persistence error the site keeps its previous status and nothing
    /// is published.
    fn transition_with<T>(
        &self,
        site: &mut Site,
        event: SiteEvent,
        persist: impl FnOnce(&mut S, SiteStatus) -> StorageResult<T>,
    ) -> Result<(SiteStatus, T), WatchError> {
        let previous = site.status;
        let status = state::apply(site, event)?;
        let site_id = site.id;
        let persisted = match self.with_storage(|s| persist(s, status)) {
            Ok(persisted) => persisted,
            Err(e) => {
                site.status = previous;
                return Err(e.into());
            }
        };

        // No subscribers is fine
        let _ = self.notifier.send(StatusChange {
            site_id,
            event,
            status,
        });
        Ok((status, persisted))
    }

    fn mark_failed(&self, site: &mut Site) {
        if let Err(e) = self.transition(site, SiteEvent::Error) {
            tracing::error!("Could not record failure of site {}: {}", site.id, e);
        }
    }

    fn with_storage<T>(&self, f: impl FnOnce(&mut S) -> StorageResult<T>) -> StorageResult<T> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::Database("storage mutex poisoned".to_string()))?;
        f(&mut storage)
    }
}
