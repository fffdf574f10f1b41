//! Site and version records
//!
//! A `Site` is a tracked URL with a monitoring status. It owns an ordered
//! history of `SiteVersion` snapshots, one per distinct content observed.

mod validation;

pub use validation::{validate_name, validate_site_url};

use crate::state::SiteStatus;
use chrono::{DateTime, Utc};

/// A tracked site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub status: SiteStatus,
}

/// A site that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
    pub name: String,
    pub url: String,
}

impl NewSite {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Checks the name is present and the url is a well-formed http/https URL
    pub fn validate(&self) -> Result<(), String> {
        validate_name(&self.name)?;
        validate_site_url(&self.url)?;
        Ok(())
    }
}

/// One stored snapshot of a site's normalized content
///
/// Ids increase with insertion, so ordering by id is chronological.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteVersion {
    pub id: i64,
    pub site_id: i64,
    pub body: String,
    pub status_code: u16,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}
