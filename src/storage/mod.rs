//! Storage module for persisting sites and their version history
//!
//! This module handles all database operations for the watcher, including:
//! - SQLite database initialization and schema management
//! - Site registration, status and last-crawled persistence
//! - Append-only version history per site

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::SiteEntry;
use crate::site::{NewSite, Site};
use std::path::Path;

/// Number of sites per page when listing
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Registers the configured sites, leaving already known ones untouched
///
/// # Returns
///
/// The stored record for every entry, in configuration order
pub fn register_sites<S: Storage + ?Sized>(
    storage: &mut S,
    entries: &[SiteEntry],
) -> StorageResult<Vec<Site>> {
    let mut sites = Vec::with_capacity(entries.len());
    for entry in entries {
        let site = storage.upsert_site(&NewSite::new(&entry.name, &entry.url))?;
        tracing::debug!("Registered site {} ({})", site.id, site.url);
        sites.push(site);
    }
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SiteStatus;

    fn entry(name: &str, url: &str) -> SiteEntry {
        SiteEntry {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_register_sites() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let entries = vec![
            entry("Docs", "https://docs.example.com/"),
            entry("Report", "https://example.com/report.pdf"),
        ];

        let sites = register_sites(&mut storage, &entries).unwrap();
        assert_eq!(sites.len(), 2);
        assert!(sites.iter().all(|s| s.status == SiteStatus::NonDiff));

        // Registering again does not duplicate
        let again = register_sites(&mut storage, &entries).unwrap();
        assert_eq!(again[0].id, sites[0].id);
        assert_eq!(storage.count_total_sites().unwrap(), 2);
    }

    #[test]
    fn test_open_storage_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.db");

        {
            let mut storage = open_storage(&path).unwrap();
            storage
                .insert_site(&NewSite::new("Docs", "https://docs.example.com/"))
                .unwrap();
        }

        let storage = open_storage(&path).unwrap();
        assert_eq!(storage.count_total_sites().unwrap(), 1);
    }
}
