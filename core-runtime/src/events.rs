//! # Events
//!
//! A `tokio::sync::broadcast` channel through which the auth manager, the
//! selection store, the upload orchestrator and the catalog client report
//! what they are doing. Hosts subscribe to drive progress bars, toasts and
//! session indicators.
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut events = bus.subscribe();
//!
//! let _ = bus.emit(CoreEvent::Upload(UploadEvent::Progress {
//!     batch_id: "batch-1".to_string(),
//!     percent: 40,
//!     bytes_sent: 400,
//!     total_bytes: 1000,
//! }));
//!
//! let event = events.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Upload(UploadEvent::Progress { percent: 40, .. })));
//! # }
//! ```
//!
//! ## Upload ordering
//!
//! One batch publishes `Started`, then `Progress` events with non-decreasing
//! `percent`, then exactly one of `Settled` or `Aborted`. `percent == 100` is
//! only published after the server answered, immediately before `Settled`.
//!
//! A subscriber that falls more than the channel capacity behind gets
//! `RecvError::Lagged` once and then continues with newer events.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Holds a burst of per-percent progress events without lagging a UI.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Auth(AuthEvent),
    Selection(SelectionEvent),
    Upload(UploadEvent),
    Catalog(CatalogEvent),
}

impl CoreEvent {
    /// Failures a host would usually surface to the user.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CoreEvent::Auth(AuthEvent::AuthError { .. })
                | CoreEvent::Upload(UploadEvent::Aborted { .. })
                | CoreEvent::Catalog(CatalogEvent::LoadFailed { .. })
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// Login or registration request sent.
    SigningIn { username: String },
    SignedIn { username: String },
    /// Account created; the new session is already stored.
    Registered { username: String },
    SignedOut { username: Option<String> },
    AuthError {
        message: String,
        /// The same request may succeed if retried.
        recoverable: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SelectionEvent {
    /// `rejected` counts offered files that were not images.
    ItemsAdded {
        accepted: usize,
        rejected: usize,
        total: usize,
    },
    ItemRemoved { index: usize, total: usize },
    /// Explicit clear, or submitted items dropped after a fully successful batch.
    Cleared { released: usize, remaining: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UploadEvent {
    Started {
        batch_id: String,
        total_items: usize,
        total_bytes: u64,
    },
    Progress {
        batch_id: String,
        percent: u8,
        bytes_sent: u64,
        total_bytes: u64,
    },
    /// The server returned a per-item result set.
    Settled {
        batch_id: String,
        total_submitted: usize,
        success_count: usize,
        failure_count: usize,
    },
    /// No per-item results; the whole batch failed.
    Aborted { batch_id: String, message: String },
}

impl UploadEvent {
    pub fn batch_id(&self) -> &str {
        match self {
            UploadEvent::Started { batch_id, .. }
            | UploadEvent::Progress { batch_id, .. }
            | UploadEvent::Settled { batch_id, .. }
            | UploadEvent::Aborted { batch_id, .. } => batch_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadEvent::Settled { .. } | UploadEvent::Aborted { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    ProductsLoaded { total_products: usize },
    ProductLoaded { product_id: String },
    LoadFailed { message: String },
}

/// Cloneable publisher handle; all clones feed one channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of subscribers reached. Fails only when nobody is subscribed,
    /// which publishers ignore.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Events published before this call are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Subscription narrowed to one upload batch.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let batch = EventStream::upload_batch(bus.subscribe(), "batch-1");
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    batch_id: String,
}

impl EventStream {
    pub fn upload_batch(receiver: Receiver<CoreEvent>, batch_id: impl Into<String>) -> Self {
        Self {
            receiver,
            batch_id: batch_id.into(),
        }
    }

    fn select(&self, event: CoreEvent) -> Option<UploadEvent> {
        match event {
            CoreEvent::Upload(upload) if upload.batch_id() == self.batch_id => Some(upload),
            _ => None,
        }
    }

    /// Next event of the batch, skipping everything else on the bus.
    pub async fn recv(&mut self) -> Result<UploadEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if let Some(upload) = self.select(event) {
                return Ok(upload);
            }
        }
    }

    /// `None` when nothing relevant is queued right now.
    pub fn try_recv(&mut self) -> Option<Result<UploadEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if let Some(upload) = self.select(event) {
                        return Some(Ok(upload));
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains queued events of the batch up to and including the terminal one.
    pub fn drain_ready(&mut self) -> Vec<UploadEvent> {
        let mut drained = Vec::new();
        while let Some(Ok(event)) = self.try_recv() {
            let terminal = event.is_terminal();
            drained.push(event);
            if terminal {
                break;
            }
        }
        drained
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("batch_id", &self.batch_id)
            .finish()
    }
}
