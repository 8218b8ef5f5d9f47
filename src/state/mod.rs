// State module - run aggregation
// Tracks the final outcome of each test across retries

pub mod result;
pub mod summary;

pub use result::{AttemptOutcome, OutcomeBucket, TestId};
pub use summary::RunSummary;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Aggregates lifecycle events of a single run.
///
/// Every attempt overwrites the previous outcome of its test, so retried tests
/// resolve to their last reported outcome. One instance is created per reporter and
/// reset on each run start.
#[derive(Debug, Clone, Default)]
pub struct RunAggregator {
    total_tests: Option<usize>,
    final_outcomes: HashMap<TestId, AttemptOutcome>,
    started_at: Option<DateTime<Utc>>,
}

impl RunAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, discarding anything recorded for a previous one
    pub fn on_run_start(&mut self, total_tests: usize) {
        self.reset();
        self.total_tests = Some(total_tests);
        self.started_at = Some(Utc::now());
    }

    /// Record the outcome of one attempt. Unknown and repeated ids are accepted.
    pub fn on_attempt_end(&mut self, id: TestId, outcome: AttemptOutcome) {
        self.final_outcomes.insert(id, outcome);
    }

    /// Produce the summary for the run. State is left intact; call
    /// `on_run_start` or `reset` before reusing the aggregator.
    pub fn on_run_end(&self, status: &str) -> RunSummary {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut timed_out = 0;

        for outcome in self.final_outcomes.values() {
            match outcome.bucket() {
                OutcomeBucket::Passed => passed += 1,
                OutcomeBucket::Skipped => skipped += 1,
                OutcomeBucket::Failed => failed += 1,
            }
            if *outcome == AttemptOutcome::TimedOut {
                timed_out += 1;
            }
        }

        // A missed (or empty) run start falls back to the distinct ids seen
        let total = match self.total_tests {
            Some(total) if total > 0 => total,
            _ => self.final_outcomes.len(),
        };

        RunSummary {
            total,
            passed,
            failed,
            skipped,
            timed_out,
            status: status.to_string(),
            duration_secs: self
                .started_at
                .map(|start| (Utc::now() - start).num_seconds()),
        }
    }

    /// Total announced at run start, if one was seen
    pub fn total_tests(&self) -> Option<usize> {
        self.total_tests
    }

    /// Number of distinct tests with a recorded outcome
    pub fn reported(&self) -> usize {
        self.final_outcomes.len()
    }

    /// Latest outcome recorded for a test
    pub fn outcome(&self, id: &TestId) -> Option<AttemptOutcome> {
        self.final_outcomes.get(id).copied()
    }

    /// Whether any event has been recorded since the last reset
    pub fn is_empty(&self) -> bool {
        self.total_tests.is_none() && self.final_outcomes.is_empty()
    }

    /// Clear all recorded state
    pub fn reset(&mut self) {
        self.total_tests = None;
        self.final_outcomes.clear();
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_resolves_to_last_outcome() {
        let mut agg = RunAggregator::new();
        agg.on_run_start(1);
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::Failed);
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::Passed);

        let summary = agg.on_run_end("passed");
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_missing_run_start_falls_back_to_reported() {
        let mut agg = RunAggregator::new();
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::Passed);
        agg.on_attempt_end(TestId::from("b"), AttemptOutcome::Skipped);

        let summary = agg.on_run_end("passed");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.duration_secs, None);
    }

    #[test]
    fn test_run_start_resets_previous_run() {
        let mut agg = RunAggregator::new();
        agg.on_run_start(2);
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::Failed);
        let _ = agg.on_run_end("failed");

        agg.on_run_start(5);
        assert_eq!(agg.reported(), 0);
        assert_eq!(agg.total_tests(), Some(5));
        assert_eq!(agg.outcome(&TestId::from("a")), None);
    }

    #[test]
    fn test_timeouts_tracked_within_failed() {
        let mut agg = RunAggregator::new();
        agg.on_run_start(3);
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::TimedOut);
        agg.on_attempt_end(TestId::from("b"), AttemptOutcome::Failed);
        agg.on_attempt_end(TestId::from("c"), AttemptOutcome::Passed);

        let summary = agg.on_run_end("failed");
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.unreported(), 0);
    }

    #[test]
    fn test_run_end_does_not_consume_state() {
        let mut agg = RunAggregator::new();
        agg.on_run_start(1);
        agg.on_attempt_end(TestId::from("a"), AttemptOutcome::Passed);

        let first = agg.on_run_end("passed");
        let second = agg.on_run_end("passed");
        assert_eq!(first.passed, second.passed);
        assert!(!agg.is_empty());
    }
}
