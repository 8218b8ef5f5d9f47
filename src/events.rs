// Lifecycle event stream
//
// The runner writes one JSON object per line:
//   {"event":"run_start","totalTests":3}
//   {"event":"attempt_end","testId":"a1","outcome":"failed","retry":0}
//   {"event":"run_end","status":"failed"}

use crate::report::Reporter;
use crate::state::{AttemptOutcome, RunSummary, TestId};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Status used when the stream ends before the runner reported one
pub const INTERRUPTED_STATUS: &str = "interrupted";

/// One lifecycle event emitted by the test runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStart {
        #[serde(rename = "totalTests")]
        total_tests: usize,
    },
    AttemptEnd {
        #[serde(rename = "testId")]
        test_id: TestId,
        outcome: AttemptOutcome,
        #[serde(default)]
        retry: u32,
    },
    RunEnd {
        status: String,
    },
}

impl RunEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Counters for one replayed stream
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    pub events: usize,
    pub malformed: usize,
    pub summaries: Vec<RunSummary>,
}

/// Feed every event from `reader` into `reporter`.
///
/// Malformed lines are logged and skipped. A run still open at end of input is
/// finalized with status `interrupted`. Only read errors are returned.
pub async fn replay<R, P>(reader: R, reporter: &mut P) -> std::io::Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
    P: Reporter,
{
    let mut stats = ReplayStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut open = false;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match RunEvent::parse(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed event");
                stats.malformed += 1;
                continue;
            }
        };
        stats.events += 1;

        match event {
            RunEvent::RunStart { total_tests } => {
                if open {
                    warn!(line = line_no, "Run started before the previous one ended");
                }
                reporter.on_run_start(total_tests);
                open = true;
            }
            RunEvent::AttemptEnd {
                test_id,
                outcome,
                retry,
            } => {
                debug!(test = %test_id, %outcome, retry, "attempt_end");
                reporter.on_attempt_end(test_id, outcome);
                open = true;
            }
            RunEvent::RunEnd { status } => {
                stats.summaries.push(reporter.on_run_end(&status).await);
                open = false;
            }
        }
    }

    if open {
        warn!("Event stream ended without run_end, finalizing as {INTERRUPTED_STATUS}");
        stats
            .summaries
            .push(reporter.on_run_end(INTERRUPTED_STATUS).await);
    }

    Ok(stats)
}
