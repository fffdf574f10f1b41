//! State module for site monitoring status
//!
//! # Components
//!
//! - `SiteStatus` / `SiteEvent`: the status machine and its transition table
//! - `apply`: applies an event to a site, rejecting transitions the table lacks
//! - `SiteLocks`: per-site mutual exclusion so one site never crawls twice at once

mod site_locks;
mod site_status;

// Re-export main types
pub use site_locks::{SiteGuard, SiteLocks};
pub use site_status::{SiteEvent, SiteStatus};

use crate::site::Site;
use crate::WatchError;

/// Applies `event` to `site`, updating its status in place
///
/// # Returns
///
/// * `Ok(SiteStatus)` - The new status
/// * `Err(WatchError::InvalidTransition)` - The event is not defined for the
///   site's current status; the site is left untouched
pub fn apply(site: &mut Site, event: SiteEvent) -> Result<SiteStatus, WatchError> {
    let from = site.status;
    let to = from
        .next(event)
        .ok_or(WatchError::InvalidTransition { from, event })?;

    tracing::debug!("Site {} status {} --{}--> {}", site.id, from, event, to);
    site.status = to;
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_with(status: SiteStatus) -> Site {
        Site {
            id: 1,
            name: "Example".to_string(),
            url: "https://example.com/".to_string(),
            last_crawled_at: None,
            status,
        }
    }

    #[test]
    fn test_apply_updates_status() {
        let mut site = site_with(SiteStatus::NonDiff);

        assert_eq!(apply(&mut site, SiteEvent::Run).unwrap(), SiteStatus::Running);
        assert_eq!(
            apply(&mut site, SiteEvent::FoundDiff).unwrap(),
            SiteStatus::ExistDiff
        );
        assert_eq!(
            apply(&mut site, SiteEvent::Check).unwrap(),
            SiteStatus::Checked
        );
        assert_eq!(site.status, SiteStatus::Checked);
    }

    #[test]
    fn test_apply_rejects_undefined_transition() {
        let mut site = site_with(SiteStatus::NonDiff);

        let err = apply(&mut site, SiteEvent::FoundDiff).unwrap_err();
        assert!(matches!(
            err,
            WatchError::InvalidTransition {
                from: SiteStatus::NonDiff,
                event: SiteEvent::FoundDiff
            }
        ));

        // Rejected transitions leave the site as it was
        assert_eq!(site.status, SiteStatus::NonDiff);
    }

    #[test]
    fn test_apply_error_from_running() {
        let mut site = site_with(SiteStatus::Running);
        assert_eq!(apply(&mut site, SiteEvent::Error).unwrap(), SiteStatus::Failed);
    }
}
