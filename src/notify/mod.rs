// Notify module - best-effort delivery of run summaries
//
// Provider specifics live behind `NotificationClient`; the functions here implement
// the delivery policy (log and swallow, upload then fall back) on top of any client.

pub mod message;
pub mod slack;

pub use message::{REPORT_FILENAME, REPORT_TITLE, fallback_message, upload_comment};
pub use slack::SlackClient;

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Failure to deliver a text message (webhook or chat fallback)
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error: {error}")]
    Api { error: String },
}

/// Failure to upload the report archive
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{step} returned HTTP {status}: {body}")]
    Status {
        step: &'static str,
        status: u16,
        body: String,
    },

    #[error("{step} failed: {error}")]
    Api { step: &'static str, error: String },

    #[error("{step} response is missing '{field}'")]
    MissingField {
        step: &'static str,
        field: &'static str,
    },
}

/// Bot token for the channel API
#[derive(Clone)]
pub struct BotCredentials {
    token: String,
}

impl BotCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for BotCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// A single file upload as the provider sees it
#[derive(Debug, Clone, Copy)]
pub struct FileUpload<'a> {
    pub channel_id: &'a str,
    pub path: &'a Path,
    pub filename: &'a str,
    pub title: &'a str,
    pub initial_comment: &'a str,
}

/// Remote file created by a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub permalink: Option<String>,
}

/// Transport to a messaging provider.
///
/// Implementations report failures; they never retry or fall back themselves.
pub trait NotificationClient: Send + Sync {
    /// POST `{"text": text}` to an incoming webhook
    fn post_webhook(
        &self,
        endpoint: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Upload a local file to a channel
    fn upload(
        &self,
        credentials: &BotCredentials,
        upload: FileUpload<'_>,
    ) -> impl Future<Output = Result<UploadedFile, UploadError>> + Send;

    /// Post a plain chat message to a channel
    fn post_message(
        &self,
        credentials: &BotCredentials,
        channel_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Archive upload request built by the pipeline
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub channel_id: String,
    /// Archive to upload
    pub file_path: PathBuf,
    /// Formatted run summary
    pub summary: String,
    /// Local report location quoted in the fallback message
    pub report_path: PathBuf,
}

/// Terminal state of an upload attempt
#[derive(Debug)]
pub enum UploadOutcome {
    /// The archive's directory does not exist; nothing was sent
    Skipped { missing_dir: PathBuf },
    Uploaded(UploadedFile),
    /// Upload failed and the plain chat message went out instead
    FellBack { message: String, cause: UploadError },
    BothFailed {
        upload: UploadError,
        fallback: DeliveryError,
    },
}

impl UploadOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }

    /// Whether anything reached the channel
    pub fn delivered(&self) -> bool {
        matches!(self, Self::Uploaded(_) | Self::FellBack { .. })
    }
}

/// Send `text` to a webhook. Failures are logged, never returned.
pub async fn send_text<C: NotificationClient>(client: &C, endpoint: &str, text: &str) -> bool {
    match client.post_webhook(endpoint, text).await {
        Ok(()) => {
            info!("Webhook notification sent");
            true
        }
        Err(DeliveryError::Status { status, body }) => {
            error!(status, body = %body, "Webhook notification failed");
            false
        }
        Err(e) => {
            error!(error = %e, "Webhook notification failed");
            false
        }
    }
}

/// Upload the report archive, falling back to a chat message on any failure.
///
/// Never fails: every terminal state is logged and returned.
pub async fn upload_file<C: NotificationClient>(
    client: &C,
    credentials: &BotCredentials,
    request: &UploadRequest,
) -> UploadOutcome {
    if let Some(dir) = request.file_path.parent()
        && !dir.as_os_str().is_empty()
        && !tokio::fs::metadata(dir)
            .await
            .is_ok_and(|meta| meta.is_dir())
    {
        warn!(dir = %dir.display(), "Report directory not found, skipping upload");
        return UploadOutcome::Skipped {
            missing_dir: dir.to_path_buf(),
        };
    }

    let comment = upload_comment(&request.summary);
    let upload = FileUpload {
        channel_id: &request.channel_id,
        path: &request.file_path,
        filename: REPORT_FILENAME,
        title: REPORT_TITLE,
        initial_comment: &comment,
    };

    let cause = match client.upload(credentials, upload).await {
        Ok(file) => {
            info!(
                file_id = %file.id,
                permalink = file.permalink.as_deref().unwrap_or("<none>"),
                "Report uploaded"
            );
            return UploadOutcome::Uploaded(file);
        }
        Err(e) => {
            warn!(error = %e, "Report upload failed, posting fallback message");
            e
        }
    };

    let message = fallback_message(&request.summary, &request.report_path);
    match client
        .post_message(credentials, &request.channel_id, &message)
        .await
    {
        Ok(()) => {
            info!(channel = %request.channel_id, "Fallback message posted");
            UploadOutcome::FellBack { message, cause }
        }
        Err(fallback) => {
            error!(error = %fallback, "Fallback message failed");
            UploadOutcome::BothFailed {
                upload: cause,
                fallback,
            }
        }
    }
}
