//! Per-stage timings for a decision run.
//!
//! Collected by [`decide_verbose_with`](crate::decide_verbose_with) only; the
//! plain entry points do not measure anything beyond the total.

use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageMetrics {
    /// Total elapsed time for the whole pipeline.
    pub total: Duration,
    /// Catalog, rule, and category fetches.
    pub fetch: Duration,
    /// Normalization and catalog matching.
    pub resolve: Duration,
    /// Rule evaluation (including applied-count writes).
    pub evaluate: Duration,
    /// Conflict detection.
    pub detect: Duration,
}
