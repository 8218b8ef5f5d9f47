// Ingest command - replay runner events and notify

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

use crate::cli::args::IngestArgs;
use crate::config::Config;
use crate::events::{self, ReplayStats};
use crate::notify::SlackClient;
use crate::report::{ConsoleReporter, NotifyReporter, Reporter, ReportingPipeline};

pub async fn handle_ingest(args: &IngestArgs, mut config: Config) -> Result<()> {
    args.apply_to(&mut config);
    let notify = &config.notify;

    let stats = if args.dry_run {
        info!("Dry-run mode enabled, nothing will be sent");
        replay_input(args.input_path(), &mut ConsoleReporter::new()).await?
    } else if !notify.reporter_enabled() {
        if notify.has_destination() {
            warn!("Notifications are disabled; set SLACK_ENABLED=true or pass --force");
        } else {
            warn!("No notification destination configured");
        }
        replay_input(args.input_path(), &mut ConsoleReporter::new()).await?
    } else {
        let client = SlackClient::with_api_base(notify.api_base.clone());
        let pipeline = ReportingPipeline::new(client, notify.pipeline_config());
        let mut reporter = NotifyReporter::new(pipeline);
        replay_input(args.input_path(), &mut reporter).await?
    };

    if stats.malformed > 0 {
        warn!(
            malformed = stats.malformed,
            "Some event lines could not be parsed"
        );
    }
    if stats.summaries.is_empty() {
        warn!("No run events found in input");
    }
    info!(
        events = stats.events,
        runs = stats.summaries.len(),
        "Event stream processed"
    );

    Ok(())
}

async fn replay_input<P: Reporter>(input: Option<&Path>, reporter: &mut P) -> Result<ReplayStats> {
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open event file: {}", path.display()))?;
            replay_from(BufReader::new(file), reporter).await
        }
        None => replay_from(BufReader::new(tokio::io::stdin()), reporter).await,
    }
}

async fn replay_from<R, P>(reader: R, reporter: &mut P) -> Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
    P: Reporter,
{
    events::replay(reader, reporter)
        .await
        .context("Failed to read event stream")
}
