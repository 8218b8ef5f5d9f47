pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod events;
pub mod logging;
pub mod notify;
pub mod report;
pub mod state;
pub mod utils;

pub use archive::build_archive;
pub use report::{Reporter, format_summary};
pub use state::{AttemptOutcome, RunAggregator, RunSummary, TestId};
