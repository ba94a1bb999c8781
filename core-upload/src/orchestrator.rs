//! # Upload Orchestrator
//!
//! Sends a [`SelectionSnapshot`] as one multipart batch and reconciles the
//! per-item result.
//!
//! ## State machine
//!
//! ```text
//! Idle ──submit──▶ InFlight { batch_id, percent } ──2xx──▶ Settled(BatchResult)
//!                                              └──error──▶ Aborted(message)
//! ```
//!
//! Only one batch may be in flight. Progress events for a batch are published
//! in order and all precede its `Settled`/`Aborted` event. The orchestrator
//! never touches the selection store; see [`UploadWorkflow`](crate::UploadWorkflow).

use crate::error::{ItemViolation, Result, UploadError, UPLOAD_FAILED_MESSAGE};
use crate::progress::ProgressTracker;
use crate::request::{build_bulk_upload_form, BULK_UPLOAD_PATH};
use crate::result::{BatchResult, BulkUploadResponse};
use crate::selection::SelectionSnapshot;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_auth::AuthManager;
use core_runtime::api::{ApiEndpoint, ApiErrorBody, FIELD_ERRORS_FALLBACK_MESSAGE};
use core_runtime::events::{CoreEvent, EventBus, UploadEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    InFlight {
        batch_id: String,
        percent: u8,
    },
    Settled(BatchResult),
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The snapshot was empty; nothing was sent.
    NoOp,
    /// The server acknowledged the batch.
    Settled {
        result: BatchResult,
        /// True only when every item succeeded.
        clear_selection: bool,
    },
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UploadOrchestrator {
    http_client: Arc<dyn HttpClient>,
    auth: Arc<AuthManager>,
    endpoint: ApiEndpoint,
    event_bus: EventBus,
    state: Arc<Mutex<UploadState>>,
    in_flight: AtomicBool,
}

impl UploadOrchestrator {
    /// `endpoint` carries the timeout for a whole batch.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        auth: Arc<AuthManager>,
        endpoint: ApiEndpoint,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            auth,
            endpoint,
            event_bus,
            state: Arc::new(Mutex::new(UploadState::Idle)),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submits `snapshot` as one batch.
    ///
    /// # Errors
    ///
    /// - `UploadError::SubmissionInProgress` - another batch is in flight
    /// - `UploadError::InvalidItems` - local metadata checks failed
    /// - `UploadError::NotAuthenticated` - nobody is signed in
    /// - `UploadError::Transport` - no response was received
    /// - `UploadError::FieldValidation` / `UploadError::Rejected` - non-2xx answer
    #[instrument(skip(self, snapshot), fields(items = snapshot.len()))]
    pub async fn submit(&self, snapshot: &SelectionSnapshot) -> Result<SubmitOutcome> {
        if snapshot.is_empty() {
            info!("Nothing to upload");
            return Ok(SubmitOutcome::NoOp);
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("Rejected submit while a batch is in flight");
            return Err(UploadError::SubmissionInProgress);
        };

        let violations = validate_snapshot(snapshot);
        if !violations.is_empty() {
            warn!(count = violations.len(), "Batch has invalid items");
            return Err(UploadError::InvalidItems(violations));
        }

        let session = self.auth.require_session().await?;
        let form = build_bulk_upload_form(snapshot)?;
        let total_bytes = form.payload_len();

        let batch_id = Uuid::new_v4().to_string();
        self.set_state(UploadState::InFlight {
            batch_id: batch_id.clone(),
            percent: 0,
        });
        self.emit(UploadEvent::Started {
            batch_id: batch_id.clone(),
            total_items: snapshot.len(),
            total_bytes,
        });
        info!(%batch_id, total_bytes, "Batch upload started");

        let tracker = Arc::new(ProgressTracker::new(
            batch_id.clone(),
            total_bytes,
            self.event_bus.clone(),
            self.state.clone(),
        ));
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.url(BULK_UPLOAD_PATH))
            .header("Accept", "application/json")
            .bearer_token(session.token())
            .timeout(self.endpoint.timeout());

        let outcome = match self
            .http_client
            .execute_multipart(request, form, tracker.clone())
            .await
        {
            Ok(response) => self.reconcile(&batch_id, snapshot.len(), response, &tracker),
            Err(e) => {
                error!(%batch_id, error = %e, "Batch upload failed before a response arrived");
                Err(UploadError::Transport(UPLOAD_FAILED_MESSAGE.to_string()))
            }
        };

        match outcome {
            Ok(result) => {
                let clear_selection = result.is_complete_success();
                info!(
                    %batch_id,
                    success_count = result.success_count,
                    failure_count = result.failure_count,
                    "Batch settled"
                );
                self.set_state(UploadState::Settled(result.clone()));
                self.emit(UploadEvent::Settled {
                    batch_id,
                    total_submitted: result.total_submitted,
                    success_count: result.success_count,
                    failure_count: result.failure_count,
                });
                Ok(SubmitOutcome::Settled {
                    result,
                    clear_selection,
                })
            }
            Err(e) => {
                let message = e.to_string();
                self.set_state(UploadState::Aborted(message.clone()));
                self.emit(UploadEvent::Aborted { batch_id, message });
                Err(e)
            }
        }
    }

    fn reconcile(
        &self,
        batch_id: &str,
        submitted: usize,
        response: HttpResponse,
        tracker: &ProgressTracker,
    ) -> Result<BatchResult> {
        if !response.is_success() {
            warn!(%batch_id, status = response.status, "Batch rejected");
            return Err(rejection(&response));
        }

        let body: BulkUploadResponse = response
            .json()
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        tracker.acknowledge();
        Ok(BatchResult::reconcile(batch_id, submitted, body))
    }

    fn set_state(&self, state: UploadState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.event_bus.emit(CoreEvent::Upload(event));
    }
}

fn validate_snapshot(snapshot: &SelectionSnapshot) -> Vec<ItemViolation> {
    snapshot
        .entries()
        .iter()
        .enumerate()
        .flat_map(|(index, entry)| {
            entry
                .metadata
                .validate()
                .into_iter()
                .map(move |v| ItemViolation {
                    index,
                    filename: entry.file.name.clone(),
                    field: v.field,
                    message: v.message,
                })
        })
        .collect()
}

fn rejection(response: &HttpResponse) -> UploadError {
    match ApiErrorBody::parse(&response.body) {
        Some(body) if body.has_field_errors() => UploadError::FieldValidation {
            message: body.message_or(FIELD_ERRORS_FALLBACK_MESSAGE),
            field_errors: body.field_errors(),
        },
        Some(body) => UploadError::Rejected {
            status: response.status,
            message: body.message_or(UPLOAD_FAILED_MESSAGE),
        },
        None => UploadError::Rejected {
            status: response.status,
            message: UPLOAD_FAILED_MESSAGE.to_string(),
        },
    }
}
