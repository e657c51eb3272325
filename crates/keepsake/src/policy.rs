//! Retention policy value type
//!
//! Four day-count windows, one per retention tier. The policy is built once
//! per run and passed by reference into the classifier.

use serde::{Deserialize, Serialize};

/// Tiered retention windows, each measured in days back from "now".
///
/// The four windows are independent: no ordering between them is enforced,
/// so a caller may set `daily` larger than `weekly`. A negative window
/// simply means the tier never fires; it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Window for the monthly tier
    pub monthly: i64,
    /// Window for the weekly tier
    pub weekly: i64,
    /// Window for the daily tier
    pub daily: i64,
    /// Window for the intra-daily tier (everything this recent is kept)
    pub intra_daily: i64,
}

impl RetentionPolicy {
    pub fn new(monthly: i64, weekly: i64, daily: i64, intra_daily: i64) -> Self {
        Self {
            monthly,
            weekly,
            daily,
            intra_daily,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            // effectively "keep one per month forever"
            monthly: 99999,
            weekly: 45,
            daily: 21,
            intra_daily: 3,
        }
    }
}
