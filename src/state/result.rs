// Per-attempt result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of one test case across all of its attempts within a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outcome of a single attempt, as reported by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    Passed,
    Failed,
    TimedOut,
    Skipped,
}

impl AttemptOutcome {
    /// Summary bucket for this outcome; timeouts count as failures
    pub fn bucket(self) -> OutcomeBucket {
        match self {
            Self::Passed => OutcomeBucket::Passed,
            Self::Skipped => OutcomeBucket::Skipped,
            Self::Failed | Self::TimedOut => OutcomeBucket::Failed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttemptOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "timedOut" | "timedout" => Ok(Self::TimedOut),
            "skipped" => Ok(Self::Skipped),
            other => Err(format!("unknown attempt outcome '{}'", other)),
        }
    }
}

/// Counting bucket used by the run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeBucket {
    Passed,
    Failed,
    Skipped,
}
