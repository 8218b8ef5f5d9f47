// CLI argument definitions using Clap

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Posts test-run summaries and HTML reports to chat
#[derive(Parser, Debug)]
#[command(name = "testrun-notify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Aggregate test runner lifecycle events and notify a chat channel",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose debug output
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Print shell completion (bash, zsh, fish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "powershell"])]
    pub completion: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay lifecycle events (NDJSON) and notify when each run ends
    Ingest(IngestArgs),

    /// Pack a report directory into a sibling zip
    Archive(ArchiveArgs),

    /// Show the effective configuration
    Config,

    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct IngestArgs {
    /// Event file; stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Webhook receiving the text summary
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Channel receiving the report archive
    #[arg(long, value_name = "CHANNEL")]
    pub channel_id: Option<String>,

    /// Rendered HTML report directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Print the summary without sending anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Notify even when the enabled flag is off
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

impl IngestArgs {
    /// Input file, or `None` for stdin
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }

    /// Command-line flags take precedence over file and environment
    pub fn apply_to(&self, config: &mut Config) {
        let notify = &mut config.notify;
        if let Some(url) = &self.webhook_url {
            notify.webhook_url = Some(url.clone());
        }
        if let Some(channel) = &self.channel_id {
            notify.channel_id = Some(channel.clone());
        }
        if let Some(dir) = &self.report_dir {
            notify.report_dir = dir.clone();
        }
        if self.force {
            notify.enabled = true;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Report directory to pack
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    /// Destination file
    #[arg(value_name = "CONFIG_FILE", default_value = crate::config::CONFIG_FILE_NAME)]
    pub path: PathBuf,
}
