// Reporting pipeline - delivers one finished run to the configured destinations
//
// Every step is best-effort: the webhook and the archive upload are attempted
// independently and no failure leaves this module.

use super::format_summary;
use crate::archive::{self, ArchiveError};
use crate::notify::{self, BotCredentials, NotificationClient, UploadOutcome, UploadRequest};
use crate::state::RunSummary;
use crate::utils::FileUtils;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Report directory used when none is configured
pub const DEFAULT_REPORT_DIR: &str = "playwright-report";

/// Destinations for one pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub webhook_url: Option<String>,
    pub credentials: Option<BotCredentials>,
    pub channel_id: Option<String>,
    pub report_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            credentials: None,
            channel_id: None,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl PipelineConfig {
    /// Upload needs both a token and a channel
    pub fn upload_target(&self) -> Option<(&BotCredentials, &str)> {
        match (&self.credentials, &self.channel_id) {
            (Some(credentials), Some(channel)) => Some((credentials, channel.as_str())),
            _ => None,
        }
    }

    pub fn has_destination(&self) -> bool {
        self.webhook_url.is_some() || self.upload_target().is_some()
    }
}

/// What happened on the upload path
#[derive(Debug)]
pub enum UploadStage {
    /// The report could not be archived; nothing was sent to the channel
    ArchiveFailed(ArchiveError),
    Attempted(UploadOutcome),
}

/// Result of one dispatch, for logging and inspection
#[derive(Debug)]
pub struct DispatchReport {
    pub text: String,
    /// `Some(delivered)` when a webhook is configured
    pub webhook: Option<bool>,
    /// Present when a token and channel are configured
    pub upload: Option<UploadStage>,
}

/// Owns the temporary archive.
///
/// `remove` deletes it on the async path; dropping an unremoved guard (early
/// return, panic) deletes it synchronously.
#[derive(Debug)]
pub struct ArchiveGuard {
    path: PathBuf,
    removed: bool,
}

impl ArchiveGuard {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the archive without blocking the runtime
    pub async fn remove(mut self) {
        let result = tokio::fs::remove_file(&self.path).await;
        log_removal(&self.path, result);
        self.removed = true;
    }
}

impl Drop for ArchiveGuard {
    fn drop(&mut self) {
        if !self.removed {
            log_removal(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Report archive removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove report archive"
        ),
    }
}

/// Formats a summary and hands it to a notification client
#[derive(Debug, Clone)]
pub struct ReportingPipeline<C> {
    client: C,
    config: PipelineConfig,
}

impl<C: NotificationClient> ReportingPipeline<C> {
    pub fn new(client: C, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deliver `summary` to every configured destination
    pub async fn dispatch(&self, summary: &RunSummary) -> DispatchReport {
        let text = format_summary(summary);

        let webhook = match &self.config.webhook_url {
            Some(url) => Some(notify::send_text(&self.client, url, &text).await),
            None => None,
        };

        let upload = match self.config.upload_target() {
            Some((credentials, channel)) => {
                Some(self.upload_report(credentials, channel, &text).await)
            }
            None => None,
        };

        if webhook.is_none() && upload.is_none() {
            debug!("No notification destination configured");
        }

        DispatchReport {
            text,
            webhook,
            upload,
        }
    }

    async fn upload_report(
        &self,
        credentials: &BotCredentials,
        channel: &str,
        text: &str,
    ) -> UploadStage {
        let report_dir = self.config.report_dir.clone();
        let entry = FileUtils::report_entry(&report_dir);
        if !entry.is_file() {
            warn!(entry = %entry.display(), "Report entry page not found");
        }

        let source = report_dir.clone();
        let built = tokio::task::spawn_blocking(move || archive::build_archive(&source))
            .await
            .unwrap_or_else(|e| Err(ArchiveError::Task(e.to_string())));
        let guard = match built {
            Ok(path) => ArchiveGuard::new(path),
            Err(e) => {
                error!(
                    report_dir = %report_dir.display(),
                    error = %e,
                    "Failed to archive report, skipping upload"
                );
                return UploadStage::ArchiveFailed(e);
            }
        };
        info!(
            archive = %guard.path().display(),
            bytes = FileUtils::file_size(guard.path()).unwrap_or(0),
            "Report archived"
        );

        let request = UploadRequest {
            channel_id: channel.to_string(),
            file_path: guard.path().to_path_buf(),
            summary: text.to_string(),
            report_path: entry,
        };
        let outcome = notify::upload_file(&self.client, credentials, &request).await;

        guard.remove().await;
        UploadStage::Attempted(outcome)
    }
}
