//! Statistics generation from the watch database
//!
//! This module provides functionality for extracting and displaying
//! site and version statistics from the storage layer.

use crate::state::SiteStatus;
use crate::storage::{Storage, StorageResult, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Per-site line of the statistics report
#[derive(Debug, Clone)]
pub struct SiteSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub status: SiteStatus,
    pub last_crawled_at: Option<DateTime<Utc>>,

    /// Position of the current version in the site's history (0 if none)
    pub version_number: u64,
}

/// Watch statistics summary
#[derive(Debug, Clone)]
pub struct WatchStatistics {
    /// Total number of tracked sites
    pub total_sites: u64,

    /// Total number of stored versions across all sites
    pub total_versions: u64,

    /// Count of sites by status
    pub sites_by_status: HashMap<SiteStatus, u64>,

    /// Every site, in id order
    pub sites: Vec<SiteSummary>,
}

impl WatchStatistics {
    /// Sites that need an operator to look at them
    pub fn awaiting_review(&self) -> impl Iterator<Item = &SiteSummary> {
        self.sites.iter().filter(|s| s.status.awaits_review())
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(WatchStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: Storage + ?Sized>(storage: &S) -> StorageResult<WatchStatistics> {
    let total_sites = storage.count_total_sites()?;
    let total_versions = storage.count_total_versions()?;

    let mut sites_by_status = HashMap::new();
    for status in SiteStatus::all_statuses() {
        let count = storage.count_sites_by_status(status)?;
        if count > 0 {
            sites_by_status.insert(status, count);
        }
    }

    let mut sites = Vec::new();
    let mut offset = 0;
    loop {
        let page = storage.list_sites(DEFAULT_PAGE_SIZE, offset)?;
        if page.is_empty() {
            break;
        }
        offset += page.len() as u32;

        for site in page {
            let current = storage.current_version(site.id)?;
            let version_number = storage.version_number(site.id, current.map(|v| v.id))?;
            sites.push(SiteSummary {
                id: site.id,
                name: site.name,
                url: site.url,
                status: site.status,
                last_crawled_at: site.last_crawled_at,
                version_number,
            });
        }
    }

    Ok(WatchStatistics {
        total_sites,
        total_versions,
        sites_by_status,
        sites,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &WatchStatistics) {
    println!("=== Watch Statistics ===\n");
    println!("Sites:    {}", stats.total_sites);
    println!("Versions: {}", stats.total_versions);

    println!("\nSites by status:");
    for status in SiteStatus::all_statuses() {
        let count = stats.sites_by_status.get(&status).copied().unwrap_or(0);
        println!("  {:<12} {}", status.to_db_string(), count);
    }

    if !stats.sites.is_empty() {
        println!("\nSites:");
        for site in &stats.sites {
            let crawled = site
                .last_crawled_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());
            println!(
                "  [{}] {} <{}> {} v{} (last crawled {})",
                site.id, site.name, site.url, site.status, site.version_number, crawled
            );
        }
    }

    let review: Vec<_> = stats.awaiting_review().collect();
    if !review.is_empty() {
        println!("\nAwaiting review ({}):", review.len());
        for site in review {
            println!("  [{}] {} ({})", site.id, site.name, site.status);
        }
    }
}
