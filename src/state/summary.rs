// Finalized run summary

use serde::Serialize;

/// Derived counts for one finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Subset of `failed` that ended in a timeout
    pub timed_out: usize,
    /// Run-level status as reported by the runner
    pub status: String,
    /// Wall-clock seconds between run start and run end, when both were observed
    pub duration_secs: Option<i64>,
}

impl RunSummary {
    /// Number of tests with a recorded final outcome
    pub fn reported(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn status_upper(&self) -> String {
        self.status.to_uppercase()
    }

    /// Tests known at start that never reported an outcome
    pub fn unreported(&self) -> usize {
        self.total.saturating_sub(self.reported())
    }
}
