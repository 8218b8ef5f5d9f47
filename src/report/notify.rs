// Notification reporter - aggregates a run and dispatches it when the run ends

use super::{DispatchReport, Reporter, ReportingPipeline};
use crate::notify::NotificationClient;
use crate::state::{AttemptOutcome, RunAggregator, RunSummary, TestId};
use tracing::{debug, info};

/// Reporter wiring a `RunAggregator` to a `ReportingPipeline`
pub struct NotifyReporter<C> {
    aggregator: RunAggregator,
    pipeline: ReportingPipeline<C>,
    last_dispatch: Option<DispatchReport>,
}

impl<C: NotificationClient> NotifyReporter<C> {
    pub fn new(pipeline: ReportingPipeline<C>) -> Self {
        Self {
            aggregator: RunAggregator::new(),
            pipeline,
            last_dispatch: None,
        }
    }

    /// Outcome of the most recent dispatch
    pub fn last_dispatch(&self) -> Option<&DispatchReport> {
        self.last_dispatch.as_ref()
    }
}

impl<C: NotificationClient> Reporter for NotifyReporter<C> {
    fn on_run_start(&mut self, total_tests: usize) {
        debug!(total_tests, "Run started");
        self.aggregator.on_run_start(total_tests);
    }

    fn on_attempt_end(&mut self, id: TestId, outcome: AttemptOutcome) {
        debug!(test = %id, %outcome, "Attempt finished");
        self.aggregator.on_attempt_end(id, outcome);
    }

    async fn on_run_end(&mut self, status: &str) -> RunSummary {
        let summary = self.aggregator.on_run_end(status);
        info!(
            status = %summary.status,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "Run finished"
        );

        let report = self.pipeline.dispatch(&summary).await;
        self.last_dispatch = Some(report);
        summary
    }
}
