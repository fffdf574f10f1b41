//! Output module for reporting on watched sites
//!
//! This module handles:
//! - Loading per-status counts and version totals
//! - Printing a per-site report for operators

pub mod stats;

pub use stats::{load_statistics, print_statistics, SiteSummary, WatchStatistics};
