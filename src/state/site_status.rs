/// Site status definitions and the transition table that drives them
///
/// A site's status reflects the outcome of its most recent check. Crawls move
/// it through `running` into one of the outcome states; operators acknowledge
/// results with `check`.
use std::fmt;

/// Represents the monitoring status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteStatus {
    /// Last crawl matched the previous version (initial state)
    NonDiff,

    /// A crawl is in progress
    Running,

    /// Last crawl stored a new version that nobody has reviewed yet
    ExistDiff,

    /// Last crawl could not complete
    Failed,

    /// An operator acknowledged the last diff or failure
    Checked,
}

/// Events that move a site between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteEvent {
    /// A crawl is starting
    Run,

    /// The crawl stored a new version
    FoundDiff,

    /// The crawl matched the last stored version
    NoDiff,

    /// Operator acknowledgment
    Check,

    /// The crawl failed; valid from any status
    Error,
}

impl SiteStatus {
    /// Returns the status a freshly registered site starts in
    pub fn initial() -> Self {
        Self::NonDiff
    }

    /// Returns the status reached by applying `event`, or `None` if the
    /// transition is not in the table.
    ///
    /// | Event | From | To |
    /// |-------|------|----|
    /// | run | non_diff, checked, exist_diff, failed | running |
    /// | found_diff | running | exist_diff |
    /// | no_diff | running | non_diff |
    /// | check | failed, exist_diff | checked |
    /// | error | any | failed |
    pub fn next(self, event: SiteEvent) -> Option<Self> {
        use SiteEvent as E;
        use SiteStatus as S;

        match (event, self) {
            (E::Run, S::NonDiff | S::Checked | S::ExistDiff | S::Failed) => Some(S::Running),
            (E::FoundDiff, S::Running) => Some(S::ExistDiff),
            (E::NoDiff, S::Running) => Some(S::NonDiff),
            (E::Check, S::Failed | S::ExistDiff) => Some(S::Checked),
            (E::Error, _) => Some(S::Failed),
            _ => None,
        }
    }

    /// Returns true if `event` may be applied from this status
    pub fn permits(self, event: SiteEvent) -> bool {
        self.next(event).is_some()
    }

    /// Returns true if the site is waiting on an operator to look at it
    pub fn awaits_review(&self) -> bool {
        matches!(self, Self::ExistDiff | Self::Failed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::NonDiff => "non_diff",
            Self::Running => "running",
            Self::ExistDiff => "exist_diff",
            Self::Failed => "failed",
            Self::Checked => "checked",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "non_diff" => Some(Self::NonDiff),
            "running" => Some(Self::Running),
            "exist_diff" => Some(Self::ExistDiff),
            "failed" => Some(Self::Failed),
            "checked" => Some(Self::Checked),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> [Self; 5] {
        [
            Self::NonDiff,
            Self::Running,
            Self::ExistDiff,
            Self::Failed,
            Self::Checked,
        ]
    }
}

impl SiteEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::FoundDiff => "found_diff",
            Self::NoDiff => "no_diff",
            Self::Check => "check",
            Self::Error => "error",
        }
    }

    pub fn all_events() -> [Self; 5] {
        [
            Self::Run,
            Self::FoundDiff,
            Self::NoDiff,
            Self::Check,
            Self::Error,
        ]
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

impl fmt::Display for SiteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        assert_eq!(SiteStatus::initial(), SiteStatus::NonDiff);
    }

    #[test]
    fn test_run_transitions() {
        assert_eq!(
            SiteStatus::NonDiff.next(SiteEvent::Run),
            Some(SiteStatus::Running)
        );
        assert_eq!(
            SiteStatus::Checked.next(SiteEvent::Run),
            Some(SiteStatus::Running)
        );
        assert_eq!(
            SiteStatus::ExistDiff.next(SiteEvent::Run),
            Some(SiteStatus::Running)
        );
        assert_eq!(
            SiteStatus::Failed.next(SiteEvent::Run),
            Some(SiteStatus::Running)
        );

        // A crawl already in flight cannot be started again
        assert_eq!(SiteStatus::Running.next(SiteEvent::Run), None);
    }

    #[test]
    fn test_outcome_transitions_only_from_running() {
        assert_eq!(
            SiteStatus::Running.next(SiteEvent::FoundDiff),
            Some(SiteStatus::ExistDiff)
        );
        assert_eq!(
            SiteStatus::Running.next(SiteEvent::NoDiff),
            Some(SiteStatus::NonDiff)
        );

        for status in SiteStatus::all_statuses() {
            if status == SiteStatus::Running {
                continue;
            }
            assert!(!status.permits(SiteEvent::FoundDiff), "{}", status);
            assert!(!status.permits(SiteEvent::NoDiff), "{}", status);
        }
    }

    #[test]
    fn test_found_diff_from_non_diff_is_rejected() {
        assert_eq!(SiteStatus::NonDiff.next(SiteEvent::FoundDiff), None);
    }

    #[test]
    fn test_check_transitions() {
        assert_eq!(
            SiteStatus::Failed.next(SiteEvent::Check),
            Some(SiteStatus::Checked)
        );
        assert_eq!(
            SiteStatus::ExistDiff.next(SiteEvent::Check),
            Some(SiteStatus::Checked)
        );

        assert_eq!(SiteStatus::NonDiff.next(SiteEvent::Check), None);
        assert_eq!(SiteStatus::Running.next(SiteEvent::Check), None);
        assert_eq!(SiteStatus::Checked.next(SiteEvent::Check), None);
    }

    #[test]
    fn test_error_is_valid_from_any_status() {
        for status in SiteStatus::all_statuses() {
            assert_eq!(status.next(SiteEvent::Error), Some(SiteStatus::Failed));
        }
    }

    #[test]
    fn test_transition_table_size() {
        let allowed = SiteStatus::all_statuses()
            .iter()
            .flat_map(|s| SiteEvent::all_events().map(|e| (*s, e)))
            .filter(|(s, e)| s.permits(*e))
            .count();

        // run: 4, found_diff: 1, no_diff: 1, check: 2, error: 5
        assert_eq!(allowed, 13);
    }

    #[test]
    fn test_awaits_review() {
        assert!(SiteStatus::ExistDiff.awaits_review());
        assert!(SiteStatus::Failed.awaits_review());

        assert!(!SiteStatus::NonDiff.awaits_review());
        assert!(!SiteStatus::Running.awaits_review());
        assert!(!SiteStatus::Checked.awaits_review());
    }

    #[test]
    fn test_db_strings() {
        assert_eq!(SiteStatus::NonDiff.to_db_string(), "non_diff");
        assert_eq!(SiteStatus::ExistDiff.to_db_string(), "exist_diff");
        assert_eq!(
            SiteStatus::from_db_string("checked"),
            Some(SiteStatus::Checked)
        );
        assert_eq!(SiteStatus::from_db_string("fetching"), None);

        for status in SiteStatus::all_statuses() {
            assert_eq!(
                SiteStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SiteStatus::Running), "running");
        assert_eq!(format!("{}", SiteEvent::FoundDiff), "found_diff");
    }
}
