// Report module - run lifecycle reporters

pub mod console;
pub mod notify;
pub mod pipeline;

pub use console::ConsoleReporter;
pub use notify::NotifyReporter;
pub use pipeline::{ArchiveGuard, DispatchReport, PipelineConfig, ReportingPipeline, UploadStage};

use crate::state::{AttemptOutcome, RunSummary, TestId};
use std::future::Future;

/// Reporter trait
///
/// Callbacks are driven sequentially by one event source; implementations hold
/// their own per-run state.
pub trait Reporter {
    /// Called when a run starts with the number of tests it will execute
    fn on_run_start(&mut self, total_tests: usize);

    /// Called once per attempt, retries included
    fn on_attempt_end(&mut self, id: TestId, outcome: AttemptOutcome);

    /// Called once when the run finishes
    fn on_run_end(&mut self, status: &str) -> impl Future<Output = RunSummary>;
}

/// Two-line text summary sent to every destination
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "Playwright Run: {}\nTotal: {}, Passed: {}, Failed: {}, Skipped: {}",
        summary.status_upper(),
        summary.total,
        summary.passed,
        summary.failed,
        summary.skipped
    )
}
