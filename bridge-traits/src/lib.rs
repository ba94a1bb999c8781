//! # Host Bridge Traits
//!
//! What the uploader core needs from its host, expressed as traits:
//!
//! - [`HttpClient`](http::HttpClient) sends JSON requests and streamed
//!   multipart batches, reporting bytes through a
//!   [`TransferObserver`](http::TransferObserver)
//! - [`SecureStore`](storage::SecureStore) keeps the signed-in session
//! - [`PreviewProvider`](preview::PreviewProvider) allocates and releases
//!   image previews for the selection
//! - [`Clock`](time::Clock) and [`LogSink`](time::LogSink) cover time and
//!   host log forwarding
//!
//! Every trait is `Send + Sync` and used behind an `Arc`. Implementations
//! map their native failures onto [`BridgeError`](error::BridgeError);
//! `BridgeError::Transport` is reserved for "no HTTP response arrived".
//!
//! `bridge-desktop` provides implementations for macOS, Windows and Linux.

pub mod error;
pub mod http;
pub mod preview;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart,
    NoopTransferObserver, RetryPolicy, TransferObserver,
};
pub use preview::{PreviewHandle, PreviewProvider};
pub use storage::SecureStore;
pub use time::{Clock, LogLevel, LogRecord, LogSink, SystemClock};
