//! Retention classifier
//!
//! Orders a batch of dated candidates, then walks them once, crediting each
//! with the retention tiers it qualifies for. Monthly, weekly, and daily
//! tiers keep at most one candidate per bucket (first in sort order wins);
//! the intra-daily tier keeps everything inside its window.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::calendar;
use crate::error::{KeepsakeError, Result};
use crate::policy::RetentionPolicy;

/// Which end of the timeline wins a contested bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest candidates are processed first and claim buckets
    #[default]
    PreferNewest,
    /// Oldest candidates are processed first and claim buckets
    PreferOldest,
}

/// One artifact to classify: an opaque identifier plus the single timestamp
/// used for bucketing.
///
/// The classifier never looks at anything but the timestamp; deriving it
/// (from a filename, file metadata, ...) is entirely the caller's job. An
/// unset timestamp is rejected by [`classify`] rather than misclassified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp: Some(timestamp),
        }
    }
}

/// Retention tier that credited a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetentionReason {
    Monthly,
    Weekly,
    Daily,
    IntraDaily,
}

impl fmt::Display for RetentionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionReason::Monthly => write!(f, "monthly"),
            RetentionReason::Weekly => write!(f, "weekly"),
            RetentionReason::Daily => write!(f, "daily"),
            RetentionReason::IntraDaily => write!(f, "intra-daily"),
        }
    }
}

/// Verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct RetentionDecision {
    /// True iff at least one tier credited the candidate
    pub retain: bool,
    /// Crediting tiers in evaluation order (monthly, weekly, daily,
    /// intra-daily); duplicates are impossible
    pub reasons: Vec<RetentionReason>,
}

/// Bucket keys already claimed during the current pass.
///
/// Month, week, and day keys share this one flat namespace, so a claim in
/// one granularity can suppress another granularity's bucket when their
/// string keys collide (e.g. month "2024-3" vs ISO week "2024-3"). That
/// matches the survivorship behavior this classifier replicates; do not
/// split it into per-granularity sets without flagging the change.
#[derive(Debug, Default)]
struct BucketRegistry {
    claimed: HashSet<String>,
}

impl BucketRegistry {
    /// Claim `key`, returning false if it was already taken.
    fn claim(&mut self, key: &str) -> bool {
        self.claimed.insert(key.to_string())
    }
}

/// Classify `candidates` against `policy`, capturing "now" once at the
/// start of the call.
///
/// See [`classify_at`] for the full contract.
pub fn classify(
    policy: &RetentionPolicy,
    order: SortOrder,
    candidates: Vec<Candidate>,
) -> Result<Vec<(Candidate, RetentionDecision)>> {
    classify_at(policy, order, Utc::now(), candidates)
}

/// Classify `candidates` against `policy` relative to an explicit `now`.
///
/// Candidates are stable-sorted by timestamp (descending for
/// [`SortOrder::PreferNewest`], ascending otherwise) and processed in that
/// order; equal timestamps keep their input order. Output order is the
/// processing order, not the input order.
///
/// The call is all-or-nothing: any candidate with an unset timestamp fails
/// the whole batch with [`KeepsakeError::InvalidTimestamp`] and no partial
/// results are returned. Each call owns a fresh bucket registry, so
/// concurrent calls over independent candidate sets cannot interfere.
pub fn classify_at(
    policy: &RetentionPolicy,
    order: SortOrder,
    now: DateTime<Utc>,
    mut candidates: Vec<Candidate>,
) -> Result<Vec<(Candidate, RetentionDecision)>> {
    for candidate in &candidates {
        if candidate.timestamp.is_none() {
            return Err(KeepsakeError::InvalidTimestamp(candidate.id.clone()));
        }
    }

    match order {
        SortOrder::PreferNewest => candidates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortOrder::PreferOldest => candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
    }

    let mut registry = BucketRegistry::default();
    let mut decisions = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let timestamp = candidate
            .timestamp
            .ok_or_else(|| KeepsakeError::InvalidTimestamp(candidate.id.clone()))?;
        let date = timestamp.date_naive();
        let info = calendar::iso_date_info(date)?;

        // month number deliberately unpadded ("2024-3", not "2024-03")
        let month_key = format!("{}-{}", date.year(), date.month());
        let week_key = format!("{}-{}", info.iso_year, info.iso_week);

        let mut reasons = Vec::new();

        if within_window(timestamp, now, policy.monthly) && registry.claim(&month_key) {
            reasons.push(RetentionReason::Monthly);
        }
        if within_window(timestamp, now, policy.weekly) && registry.claim(&week_key) {
            reasons.push(RetentionReason::Weekly);
        }
        if within_window(timestamp, now, policy.daily) && registry.claim(&info.day_key) {
            reasons.push(RetentionReason::Daily);
        }
        // Finest tier: no bucket, everything this recent is kept
        if within_window(timestamp, now, policy.intra_daily) {
            reasons.push(RetentionReason::IntraDaily);
        }

        tracing::trace!(id = %candidate.id, ?reasons, "classified candidate");

        decisions.push((
            candidate,
            RetentionDecision {
                retain: !reasons.is_empty(),
                reasons,
            },
        ));
    }

    Ok(decisions)
}

/// Strict window test: `timestamp > now - days`. A timestamp exactly
/// `days` old does not qualify.
fn within_window(timestamp: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
    let Some(delta) = Duration::try_days(days) else {
        // window too large to represent: a positive window this big covers
        // everything, a negative one covers nothing
        return days >= 0;
    };
    match now.checked_sub_signed(delta) {
        Some(cutoff) => timestamp > cutoff,
        None => days >= 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn reasons_for<'a>(
        results: &'a [(Candidate, RetentionDecision)],
        id: &str,
    ) -> &'a [RetentionReason] {
        &results
            .iter()
            .find(|(c, _)| c.id == id)
            .expect("candidate missing from output")
            .1
            .reasons
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let policy = RetentionPolicy::new(-1, -1, 7, -1);
        let exact = Candidate::new("exact", days_ago(7));
        let inside = Candidate::new("inside", days_ago(7) + Duration::seconds(1));

        let results =
            classify_at(&policy, SortOrder::PreferNewest, now(), vec![exact, inside]).unwrap();

        assert!(reasons_for(&results, "exact").is_empty());
        assert_eq!(reasons_for(&results, "inside"), &[RetentionReason::Daily]);
    }

    #[test]
    fn test_monthly_bucket_first_occurrence_wins() {
        let policy = RetentionPolicy::new(60, -1, -1, -1);
        let newer = Candidate::new("newer", days_ago(1));
        let older = Candidate::new("older", days_ago(3));

        let results = classify_at(
            &policy,
            SortOrder::PreferNewest,
            now(),
            vec![older.clone(), newer.clone()],
        )
        .unwrap();

        assert_eq!(reasons_for(&results, "newer"), &[RetentionReason::Monthly]);
        assert!(reasons_for(&results, "older").is_empty());

        // flipping the preference hands the bucket to the older candidate
        let results =
            classify_at(&policy, SortOrder::PreferOldest, now(), vec![older, newer]).unwrap();
        assert_eq!(reasons_for(&results, "older"), &[RetentionReason::Monthly]);
        assert!(reasons_for(&results, "newer").is_empty());
    }

    #[test]
    fn test_intra_daily_is_not_deduplicated() {
        let policy = RetentionPolicy::new(-1, -1, -1, 2);
        let a = Candidate::new("a", days_ago(1));
        let b = Candidate::new("b", days_ago(1) + Duration::hours(2));

        let results = classify_at(&policy, SortOrder::PreferNewest, now(), vec![a, b]).unwrap();

        assert_eq!(reasons_for(&results, "a"), &[RetentionReason::IntraDaily]);
        assert_eq!(reasons_for(&results, "b"), &[RetentionReason::IntraDaily]);
    }

    #[test]
    fn test_reasons_follow_evaluation_order() {
        let policy = RetentionPolicy::new(30, 14, 7, 1);
        let fresh = Candidate::new("fresh", now());

        let results = classify_at(&policy, SortOrder::PreferNewest, now(), vec![fresh]).unwrap();

        assert_eq!(
            reasons_for(&results, "fresh"),
            &[
                RetentionReason::Monthly,
                RetentionReason::Weekly,
                RetentionReason::Daily,
                RetentionReason::IntraDaily,
            ]
        );
    }

    #[test]
    fn test_unset_timestamp_fails_whole_batch() {
        let policy = RetentionPolicy::default();
        let good = Candidate::new("good", now());
        let bad = Candidate {
            id: "bad".to_string(),
            timestamp: None,
        };

        let result = classify_at(&policy, SortOrder::PreferNewest, now(), vec![good, bad]);
        assert!(matches!(
            result,
            Err(KeepsakeError::InvalidTimestamp(id)) if id == "bad"
        ));
    }

    #[test]
    fn test_negative_windows_never_fire() {
        let policy = RetentionPolicy::new(-5, -5, -5, -5);
        let fresh = Candidate::new("fresh", now());

        let results = classify_at(&policy, SortOrder::PreferNewest, now(), vec![fresh]).unwrap();
        let (_, decision) = &results[0];
        assert!(!decision.retain);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn test_output_follows_sort_order() {
        let policy = RetentionPolicy::default();
        let candidates = vec![
            Candidate::new("mid", days_ago(5)),
            Candidate::new("new", days_ago(1)),
            Candidate::new("old", days_ago(9)),
        ];

        let results =
            classify_at(&policy, SortOrder::PreferNewest, now(), candidates.clone()).unwrap();
        let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);

        let results = classify_at(&policy, SortOrder::PreferOldest, now(), candidates).unwrap();
        let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
        assert_eq!(ids, ["old", "mid", "new"]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let policy = RetentionPolicy::default();
        let ts = days_ago(2);
        let candidates = vec![
            Candidate::new("first", ts),
            Candidate::new("second", ts),
            Candidate::new("third", ts),
        ];

        let results = classify_at(&policy, SortOrder::PreferNewest, now(), candidates).unwrap();
        let ids: Vec<&str> = results.iter().map(|(c, _)| c.id.as_str()).collect();
        // stable sort: ties resolved by input position
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn test_shared_registry_collides_across_granularities() {
        // Month key "2024-3" (March) and week key "2024-3" (ISO week 3,
        // mid-January) share one namespace: whichever claims first
        // suppresses the other.
        let policy = RetentionPolicy::new(90, 90, -1, -1);
        let march = Candidate::new("march", Utc.with_ymd_and_hms(2024, 3, 18, 0, 0, 0).unwrap());
        let january = Candidate::new("january", Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap());
        let reference = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();

        let results = classify_at(
            &policy,
            SortOrder::PreferNewest,
            reference,
            vec![march, january],
        )
        .unwrap();

        // march claimed month "2024-3" and week "2024-12"
        assert_eq!(
            reasons_for(&results, "march"),
            &[RetentionReason::Monthly, RetentionReason::Weekly]
        );
        // january's week key "2024-3" is already taken by march's month
        // claim, so only its own month bucket fires
        assert_eq!(reasons_for(&results, "january"), &[RetentionReason::Monthly]);
    }
}
