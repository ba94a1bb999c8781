//! `reqwest` transport.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{
        HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart,
        RetryPolicy, TransferObserver,
    },
};
use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use reqwest::{
    multipart::{Form, Part},
    Body, Client, Method,
};
use std::io;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bytes handed to the transport per progress notification.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Desktop [`HttpClient`] with pooled connections and rustls.
///
/// Multipart bodies are streamed in chunks so the observer sees bytes as the
/// socket accepts them rather than when the form is built.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Falls back to reqwest's default client if the tuned one cannot be built.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::try_with_timeout(timeout).unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            Self::with_client(Client::new())
        })
    }

    pub fn try_with_timeout(timeout: Duration) -> Result<Self> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("product-uploader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map(Self::with_client)
            .map_err(|e| BridgeError::OperationFailed(format!("HTTP client build: {}", e)))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Request line, headers and timeout. The caller attaches the body.
    fn prepare(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };
        let builder = request
            .headers
            .iter()
            .fold(self.client.request(method, &request.url), |builder, (k, v)| {
                builder.header(k, v)
            });
        match request.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.prepare(request);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let response = builder.send().await.map_err(transport_error)?;
        read_response(response).await
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_timeout() {
        BridgeError::Transport("Request timed out".to_string())
    } else if e.is_connect() {
        BridgeError::Transport(format!("Connection failed: {}", e))
    } else {
        BridgeError::Transport(e.to_string())
    }
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response.bytes().await.map_err(transport_error)?;
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn should_retry(outcome: &Result<HttpResponse>) -> bool {
    match outcome {
        Ok(response) => response.status == 429 || response.status >= 500,
        Err(BridgeError::Transport(_)) => true,
        Err(_) => false,
    }
}

/// Chunks `content`, bumping the shared counter and notifying `observer` as
/// each chunk is pulled.
fn counted_chunks(
    content: Bytes,
    sent: Arc<AtomicU64>,
    total: u64,
    observer: Arc<dyn TransferObserver>,
) -> impl Stream<Item = std::result::Result<Bytes, io::Error>> + Send + 'static {
    let chunks: Vec<Bytes> = content
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|chunk| content.slice_ref(chunk))
        .collect();

    stream::iter(chunks).map(move |chunk| {
        let len = chunk.len() as u64;
        let so_far = sent.fetch_add(len, Ordering::SeqCst) + len;
        observer.on_bytes_sent(so_far, total);
        Ok(chunk)
    })
}

fn to_reqwest_form(form: MultipartForm, observer: Arc<dyn TransferObserver>) -> Result<Form> {
    let total = form.payload_len();
    let sent = Arc::new(AtomicU64::new(0));

    form.into_parts()
        .into_iter()
        .try_fold(Form::new(), |multipart, part| {
            let (field, content, file) = match part {
                MultipartPart::File {
                    field,
                    filename,
                    mime_type,
                    content,
                } => (field, content, Some((filename, mime_type))),
                MultipartPart::Text { field, value } => (field, Bytes::from(value), None),
            };

            let len = content.len() as u64;
            let body = Body::wrap_stream(counted_chunks(
                content,
                sent.clone(),
                total,
                observer.clone(),
            ));
            let mut part = Part::stream_with_length(body, len);
            if let Some((filename, mime_type)) = file {
                part = part.file_name(filename).mime_str(&mime_type).map_err(|e| {
                    BridgeError::OperationFailed(format!("Invalid MIME type {}: {}", mime_type, e))
                })?;
            }
            Ok(multipart.part(field, part))
        })
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, RetryPolicy::default())
            .await
    }

    /// POST requests get a single attempt regardless of `policy`. The last
    /// retryable response is returned as-is.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let attempts = if request.method.is_idempotent() {
            policy.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            debug!(attempt, attempts, url = %request.url, "HTTP request");
            let outcome = self.send_once(&request).await;
            if attempt >= attempts || !should_retry(&outcome) {
                return outcome;
            }

            match &outcome {
                Ok(response) => warn!(status = response.status, attempt, "Retryable status"),
                Err(e) => warn!(error = %e, attempt, "Request failed"),
            }
            sleep(policy.backoff(attempt)).await;
            attempt += 1;
        }
    }

    async fn execute_multipart(
        &self,
        request: HttpRequest,
        form: MultipartForm,
        observer: Arc<dyn TransferObserver>,
    ) -> Result<HttpResponse> {
        debug!(
            url = %request.url,
            parts = form.parts().len(),
            payload_bytes = form.payload_len(),
            "Multipart request"
        );

        let multipart = to_reqwest_form(form, observer)?;
        let response = self
            .prepare(&request)
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Multipart request failed");
                transport_error(e)
            })?;

        read_response(response).await
    }
}
