//! HTTP transport contract.
//!
//! Plain request/response exchanges for the auth and catalog calls, plus a
//! multipart variant for batch uploads that reports bytes as they are sent.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Whether the transport may replay the request after a failure.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, HttpMethod::Post)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// Overrides the client-wide timeout for this request.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let encoded = serde_json::to_vec(body)
            .map_err(|e| BridgeError::OperationFailed(format!("Cannot encode JSON body: {}", e)))?;
        self.body = Some(Bytes::from(encoded));
        Ok(self.header("Content-Type", "application/json"))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| BridgeError::OperationFailed(format!("Cannot decode JSON body: {}", e)))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub enum MultipartPart {
    File {
        field: String,
        filename: String,
        mime_type: String,
        content: Bytes,
    },
    Text {
        field: String,
        value: String,
    },
}

impl MultipartPart {
    pub fn field(&self) -> &str {
        match self {
            MultipartPart::File { field, .. } | MultipartPart::Text { field, .. } => field,
        }
    }

    /// Payload size without multipart framing.
    pub fn payload_len(&self) -> u64 {
        match self {
            MultipartPart::File { content, .. } => content.len() as u64,
            MultipartPart::Text { value, .. } => value.len() as u64,
        }
    }
}

/// Multipart form whose parts go on the wire in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: Bytes,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            field: field.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            content,
        });
        self
    }

    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<MultipartPart> {
        self.parts
    }

    /// Sum of part payloads; the `total` passed to [`TransferObserver`].
    pub fn payload_len(&self) -> u64 {
        self.parts.iter().map(MultipartPart::payload_len).sum()
    }
}

/// Receives byte counts while a request body is written.
///
/// `sent` never decreases between calls. Called on the transport's I/O path.
pub trait TransferObserver: Send + Sync {
    fn on_bytes_sent(&self, sent: u64, total: u64);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransferObserver;

impl TransferObserver for NoopTransferObserver {
    fn on_bytes_sent(&self, _sent: u64, _total: u64) {}
}

/// How often and how patiently an idempotent request is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before the attempt following attempt number `attempt` (1-based).
    /// Doubles each time, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << doublings)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Async HTTP transport.
///
/// Any response that arrives, whatever its status, is `Ok(HttpResponse)`.
/// [`BridgeError::Transport`] means no response was received at all.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Like [`execute`](Self::execute), retrying idempotent requests that fail
    /// in transport or with a 5xx/429 status.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let _ = policy;
        self.execute(request).await
    }

    /// Sends `form` as the `multipart/form-data` body, ignoring
    /// `request.body`. Never retried.
    async fn execute_multipart(
        &self,
        request: HttpRequest,
        form: MultipartForm,
        observer: Arc<dyn TransferObserver>,
    ) -> Result<HttpResponse>;
}
