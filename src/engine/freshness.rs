//! Review staleness.

use crate::config::FreshnessPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    Fresh,
    Aging,
    Stale,
    NeverReviewed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    /// Whole days since the last review; `None` if never reviewed.
    pub days_since_review: Option<i64>,
    pub status: FreshnessStatus,
}

/// Classify how stale a review is at `now`.
///
/// A review timestamp in the future counts as zero days old.
pub fn freshness(last_reviewed: Option<DateTime<Utc>>, now: DateTime<Utc>, policy: &FreshnessPolicy) -> Freshness {
    let Some(reviewed) = last_reviewed else {
        return Freshness { days_since_review: None, status: FreshnessStatus::NeverReviewed };
    };

    let days = (now - reviewed).num_days().max(0);
    let status = if days >= policy.stale_after_days {
        FreshnessStatus::Stale
    } else if days >= policy.aging_after_days {
        FreshnessStatus::Aging
    } else {
        FreshnessStatus::Fresh
    };

    Freshness { days_since_review: Some(days), status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn never_reviewed() {
        let out = freshness(None, now(), &FreshnessPolicy::default());
        assert_eq!(out.status, FreshnessStatus::NeverReviewed);
        assert_eq!(out.days_since_review, None);
    }

    #[test]
    fn boundaries_follow_policy() {
        let policy = FreshnessPolicy { aging_after_days: 30, stale_after_days: 60 };
        let at = |days: i64| freshness(Some(now() - Duration::days(days)), now(), &policy).status;

        assert_eq!(at(0), FreshnessStatus::Fresh);
        assert_eq!(at(29), FreshnessStatus::Fresh);
        assert_eq!(at(30), FreshnessStatus::Aging);
        assert_eq!(at(59), FreshnessStatus::Aging);
        assert_eq!(at(60), FreshnessStatus::Stale);
    }

    #[test]
    fn future_reviews_clamp_to_zero() {
        let out = freshness(Some(now() + Duration::days(3)), now(), &FreshnessPolicy::default());
        assert_eq!(out.days_since_review, Some(0));
        assert_eq!(out.status, FreshnessStatus::Fresh);
    }
}
