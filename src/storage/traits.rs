//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::site::{NewSite, Site, SiteVersion};
use crate::state::SiteStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Invalid site record: {0}")]
    Validation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every method is atomic on its own; callers that need several calls to
/// hang together (a crawl) serialize them with a per-site lock.
pub trait Storage {
    // ===== Site Management =====

    /// Validates and inserts a new site with the initial status
    fn insert_site(&mut self, site: &NewSite) -> StorageResult<Site>;

    /// Inserts a site or returns the existing one with the same url
    ///
    /// An existing site keeps its status and history; only its name is refreshed.
    fn upsert_site(&mut self, site: &NewSite) -> StorageResult<Site>;

    /// Gets a site by ID
    fn load_site(&self, site_id: i64) -> StorageResult<Site>;

    /// Lists sites ordered by id, one page at a time
    fn list_sites(&self, limit: u32, offset: u32) -> StorageResult<Vec<Site>>;

    /// Gets the ids of every site, ordered
    fn list_site_ids(&self) -> StorageResult<Vec<i64>>;

    /// Gets all sites currently in `status`
    fn sites_in_status(&self, status: SiteStatus) -> StorageResult<Vec<Site>>;

    /// Deletes a site along with its whole version history
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    /// Persists a site's status
    fn update_site_status(&mut self, site_id: i64, status: SiteStatus) -> StorageResult<()>;

    /// Persists the time a crawl of the site was last attempted
    fn update_last_crawled_at(&mut self, site_id: i64, at: DateTime<Utc>) -> StorageResult<()>;

    // ===== Version History =====

    /// Gets the most recently stored version of a site
    fn load_last_version(&self, site_id: i64) -> StorageResult<Option<SiteVersion>>;

    /// The version a site is currently showing
    fn current_version(&self, site_id: i64) -> StorageResult<Option<SiteVersion>> {
        self.load_last_version(site_id)
    }

    /// Appends a version to the end of a site's history
    fn append_version(
        &mut self,
        site_id: i64,
        body: &str,
        status_code: u16,
        checksum: &str,
    ) -> StorageResult<SiteVersion>;

    /// Appends a version and sets the site's status as one unit
    ///
    /// Either both are persisted or neither is.
    fn append_version_with_status(
        &mut self,
        site_id: i64,
        body: &str,
        status_code: u16,
        checksum: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteVersion>;

    /// Gets every version of a site, oldest first
    fn list_versions(&self, site_id: i64) -> StorageResult<Vec<SiteVersion>>;

    /// Counts the versions stored for a site
    fn count_versions(&self, site_id: i64) -> StorageResult<u64>;

    /// Returns the 1-based position of a version within its site's history
    ///
    /// `None` (no version yet) is position 0.
    fn version_number(&self, site_id: i64, version_id: Option<i64>) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Counts sites by status
    fn count_sites_by_status(&self, status: SiteStatus) -> StorageResult<u64>;

    /// Gets total site count
    fn count_total_sites(&self) -> StorageResult<u64>;

    /// Gets total version count across all sites
    fn count_total_versions(&self) -> StorageResult<u64>;
}
