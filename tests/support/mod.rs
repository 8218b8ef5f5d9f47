// Shared test doubles: a recording notification client and fake HTTP endpoints
#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use testrun_notify::notify::{
    BotCredentials, DeliveryError, FileUpload, NotificationClient, UploadError, UploadedFile,
};

// ---
// Recording client
// ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Webhook {
        endpoint: String,
        text: String,
    },
    Upload {
        channel: String,
        path: PathBuf,
        filename: String,
        title: String,
        comment: String,
        /// Whether the file existed while the upload was in flight
        existed: bool,
    },
    Message {
        channel: String,
        text: String,
    },
}

#[derive(Debug, Default)]
pub struct FakeClient {
    pub fail_webhook: bool,
    pub fail_upload: bool,
    pub fail_message: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose selected calls fail
    pub fn failing(webhook: bool, upload: bool, message: bool) -> Self {
        Self {
            fail_webhook: webhook,
            fail_upload: upload,
            fail_message: message,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Message { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NotificationClient for FakeClient {
    async fn post_webhook(&self, endpoint: &str, text: &str) -> Result<(), DeliveryError> {
        self.record(Call::Webhook {
            endpoint: endpoint.to_string(),
            text: text.to_string(),
        });
        if self.fail_webhook {
            return Err(DeliveryError::Status {
                status: 500,
                body: "webhook down".to_string(),
            });
        }
        Ok(())
    }

    async fn upload(
        &self,
        _credentials: &BotCredentials,
        upload: FileUpload<'_>,
    ) -> Result<UploadedFile, UploadError> {
        self.record(Call::Upload {
            channel: upload.channel_id.to_string(),
            path: upload.path.to_path_buf(),
            filename: upload.filename.to_string(),
            title: upload.title.to_string(),
            comment: upload.initial_comment.to_string(),
            existed: upload.path.is_file(),
        });
        if self.fail_upload {
            return Err(UploadError::Api {
                step: "files.completeUploadExternal",
                error: "not_in_channel".to_string(),
            });
        }
        Ok(UploadedFile {
            id: "F0001".to_string(),
            permalink: Some("https://chat.example/files/F0001".to_string()),
        })
    }

    async fn post_message(
        &self,
        _credentials: &BotCredentials,
        channel_id: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.record(Call::Message {
            channel: channel_id.to_string(),
            text: text.to_string(),
        });
        if self.fail_message {
            return Err(DeliveryError::Api {
                error: "channel_not_found".to_string(),
            });
        }
        Ok(())
    }
}

// ---
// Fake HTTP endpoints
// ---

/// Serve `router` on an ephemeral local port
pub async fn serve(listener: tokio::net::TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

pub async fn bind() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// URL on which nothing is listening
pub async fn dead_url() -> String {
    let (listener, base) = bind().await;
    drop(listener);
    format!("{}/hook", base)
}

#[derive(Debug, Default)]
pub struct WebhookRecord {
    pub bodies: Vec<Value>,
    pub content_types: Vec<String>,
}

/// Webhook answering every POST with `status` and `body`
pub async fn webhook(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<WebhookRecord>>) {
    let record = Arc::new(Mutex::new(WebhookRecord::default()));
    let state = record.clone();
    let router = Router::new().route(
        "/hook",
        post(
            move |headers: HeaderMap, Json(payload): Json<Value>| async move {
                let mut rec = state.lock().unwrap();
                rec.bodies.push(payload);
                rec.content_types.push(
                    headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string(),
                );
                (status, body)
            },
        ),
    );

    let (listener, base) = bind().await;
    serve(listener, router).await;
    (format!("{}/hook", base), record)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlackBehavior {
    pub fail_upload_bytes: bool,
    pub fail_complete: bool,
    pub fail_message: bool,
}

#[derive(Debug, Default)]
pub struct SlackRecord {
    pub auth: Vec<String>,
    pub upload_form: Option<HashMap<String, String>>,
    pub uploaded: Option<Vec<u8>>,
    pub complete: Option<Value>,
    pub messages: Vec<Value>,
}

#[derive(Clone)]
struct SlackState {
    base: String,
    behavior: SlackBehavior,
    record: Arc<Mutex<SlackRecord>>,
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn get_upload_url(
    State(state): State<SlackState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let mut rec = state.record.lock().unwrap();
    rec.auth.push(bearer(&headers));
    rec.upload_form = Some(form);
    Json(json!({
        "ok": true,
        "upload_url": format!("{}/upload/F123", state.base),
        "file_id": "F123",
    }))
}

async fn upload_bytes(State(state): State<SlackState>, body: Bytes) -> StatusCode {
    state.record.lock().unwrap().uploaded = Some(body.to_vec());
    if state.behavior.fail_upload_bytes {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn complete_upload(
    State(state): State<SlackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut rec = state.record.lock().unwrap();
    rec.auth.push(bearer(&headers));
    rec.complete = Some(body);
    if state.behavior.fail_complete {
        return Json(json!({ "ok": false, "error": "not_in_channel" }));
    }
    Json(json!({
        "ok": true,
        "files": [{
            "id": "F123",
            "title": "Playwright Report",
            "permalink": "https://chat.example/files/F123",
        }],
    }))
}

async fn post_message(
    State(state): State<SlackState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut rec = state.record.lock().unwrap();
    rec.auth.push(bearer(&headers));
    rec.messages.push(body);
    if state.behavior.fail_message {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": "internal_error" })),
        );
    }
    (StatusCode::OK, Json(json!({ "ok": true })))
}

/// Minimal Slack Web API; returns the API base URL
pub async fn slack(behavior: SlackBehavior) -> (String, Arc<Mutex<SlackRecord>>) {
    let (listener, base) = bind().await;
    let record = Arc::new(Mutex::new(SlackRecord::default()));
    let state = SlackState {
        base: base.clone(),
        behavior,
        record: record.clone(),
    };

    let router = Router::new()
        .route("/api/files.getUploadURLExternal", post(get_upload_url))
        .route("/upload/F123", post(upload_bytes))
        .route("/api/files.completeUploadExternal", post(complete_upload))
        .route("/api/chat.postMessage", post(post_message))
        .with_state(state);

    serve(listener, router).await;
    (format!("{}/api", base), record)
}

// ---
// Report fixtures
// ---

/// Write a small HTML report tree under `root/name`
pub fn write_report(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("data")).unwrap();
    std::fs::write(dir.join("index.html"), "<html><body>report</body></html>").unwrap();
    std::fs::write(dir.join("data/trace.zip"), vec![7u8; 4096]).unwrap();
    dir
}
