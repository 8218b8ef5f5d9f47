// Slack transport: incoming webhooks and the bot-token Web API

use super::{
    BotCredentials, DeliveryError, FileUpload, NotificationClient, UploadError, UploadedFile,
};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

const GET_UPLOAD_URL: &str = "files.getUploadURLExternal";
const UPLOAD_BYTES: &str = "upload";
const COMPLETE_UPLOAD: &str = "files.completeUploadExternal";
const POST_MESSAGE: &str = "chat.postMessage";

/// Slack client sharing one connection pool across calls
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    upload_url: Option<String>,
    file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompleteUploadResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    files: Vec<CompletedFile>,
}

#[derive(Debug, Deserialize)]
struct CompletedFile {
    id: String,
    permalink: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackClient {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Client against a non-default Web API root (proxies, test servers)
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            api_base,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn upload_json<T: DeserializeOwned>(
        resp: Response,
        step: &'static str,
    ) -> Result<T, UploadError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                step,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

impl NotificationClient for SlackClient {
    async fn post_webhook(&self, endpoint: &str, text: &str) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(endpoint)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn upload(
        &self,
        credentials: &BotCredentials,
        upload: FileUpload<'_>,
    ) -> Result<UploadedFile, UploadError> {
        let io_err = |source: std::io::Error| UploadError::Io {
            path: upload.path.to_path_buf(),
            source,
        };
        let length = tokio::fs::metadata(upload.path)
            .await
            .map_err(io_err)?
            .len();

        // 1. reserve an upload slot
        let resp = self
            .http
            .post(self.method_url(GET_UPLOAD_URL))
            .bearer_auth(credentials.token())
            .form(&[
                ("filename", upload.filename.to_string()),
                ("length", length.to_string()),
            ])
            .send()
            .await?;
        let slot: UploadUrlResponse = Self::upload_json(resp, GET_UPLOAD_URL).await?;
        if !slot.ok {
            return Err(UploadError::Api {
                step: GET_UPLOAD_URL,
                error: slot.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        let upload_url = slot.upload_url.ok_or(UploadError::MissingField {
            step: GET_UPLOAD_URL,
            field: "upload_url",
        })?;
        let file_id = slot.file_id.ok_or(UploadError::MissingField {
            step: GET_UPLOAD_URL,
            field: "file_id",
        })?;
        debug!(file_id = %file_id, length, "Upload slot reserved");

        // 2. stream the file body
        let file = tokio::fs::File::open(upload.path).await.map_err(io_err)?;
        let resp = self
            .http
            .post(&upload_url)
            .header(CONTENT_LENGTH, length)
            .body(reqwest::Body::from(file))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Status {
                step: UPLOAD_BYTES,
                status: status.as_u16(),
                body,
            });
        }

        // 3. share it into the channel
        let resp = self
            .http
            .post(self.method_url(COMPLETE_UPLOAD))
            .bearer_auth(credentials.token())
            .json(&json!({
                "files": [{ "id": file_id, "title": upload.title }],
                "channel_id": upload.channel_id,
                "initial_comment": upload.initial_comment,
            }))
            .send()
            .await?;
        let done: CompleteUploadResponse = Self::upload_json(resp, COMPLETE_UPLOAD).await?;
        if !done.ok {
            return Err(UploadError::Api {
                step: COMPLETE_UPLOAD,
                error: done.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        let permalink = done
            .files
            .into_iter()
            .find(|f| f.id == file_id)
            .and_then(|f| f.permalink);
        Ok(UploadedFile {
            id: file_id,
            permalink,
        })
    }

    async fn post_message(
        &self,
        credentials: &BotCredentials,
        channel_id: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(self.method_url(POST_MESSAGE))
            .bearer_auth(credentials.token())
            .json(&json!({ "channel": channel_id, "text": text }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: PostMessageResponse = resp.json().await?;
        if !reply.ok {
            return Err(DeliveryError::Api {
                error: reply.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_trailing_slash() {
        let client = SlackClient::with_api_base("http://localhost:9000/api/");
        assert_eq!(client.api_base(), "http://localhost:9000/api");
        assert_eq!(
            client.method_url(POST_MESSAGE),
            "http://localhost:9000/api/chat.postMessage"
        );
    }

    #[test]
    fn test_default_api_base() {
        assert_eq!(SlackClient::default().api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_complete_response_without_permalink() {
        let parsed: CompleteUploadResponse =
            serde_json::from_str(r#"{"ok":true,"files":[{"id":"F1","title":"t"}]}"#).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.files[0].id, "F1");
        assert!(parsed.files[0].permalink.is_none());
    }
}
