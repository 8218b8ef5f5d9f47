// Console reporter - prints the run summary locally

use super::{Reporter, format_summary};
use crate::state::{AttemptOutcome, RunAggregator, RunSummary, TestId};
use std::io::{self, Write};

/// Console reporter
pub struct ConsoleReporter<W = io::Stdout> {
    aggregator: RunAggregator,
    out: W,
}

impl ConsoleReporter {
    /// Create a console reporter writing to stdout
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            aggregator: RunAggregator::new(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print summary
    pub fn print_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        let rule = "═".repeat(64);
        writeln!(self.out)?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "{}", format_summary(summary))?;
        if summary.timed_out > 0 {
            writeln!(
                self.out,
                "   • Timed out: {} (counted as failed)",
                summary.timed_out
            )?;
        }
        if summary.unreported() > 0 {
            writeln!(self.out, "   • Not reported: {}", summary.unreported())?;
        }
        if let Some(secs) = summary.duration_secs {
            writeln!(self.out, "   • Duration: {}s", secs)?;
        }
        writeln!(self.out, "{}", rule)?;
        self.out.flush()
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_run_start(&mut self, total_tests: usize) {
        self.aggregator.on_run_start(total_tests);
    }

    fn on_attempt_end(&mut self, id: TestId, outcome: AttemptOutcome) {
        self.aggregator.on_attempt_end(id, outcome);
    }

    async fn on_run_end(&mut self, status: &str) -> RunSummary {
        let summary = self.aggregator.on_run_end(status);
        // Local output only; a closed stdout must not turn into a failure
        let _ = self.print_summary(&summary);
        summary
    }
}
