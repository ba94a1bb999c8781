//! Ties the selection store to the orchestrator.

use crate::error::{Result, UploadError};
use crate::orchestrator::{SubmitOutcome, UploadOrchestrator, UploadState};
use crate::selection::SelectionStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Shared handle to the working set.
pub type SharedSelection = Arc<Mutex<SelectionStore>>;

pub struct UploadWorkflow {
    selection: SharedSelection,
    orchestrator: Arc<UploadOrchestrator>,
    /// Held from snapshot until the submitted items are released.
    submitting: Mutex<()>,
}

impl UploadWorkflow {
    pub fn new(selection: SharedSelection, orchestrator: Arc<UploadOrchestrator>) -> Self {
        Self {
            selection,
            orchestrator,
            submitting: Mutex::new(()),
        }
    }

    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    pub fn orchestrator(&self) -> &Arc<UploadOrchestrator> {
        &self.orchestrator
    }

    pub fn state(&self) -> UploadState {
        self.orchestrator.state()
    }

    /// Uploads the current selection.
    ///
    /// The store stays editable while the request is in flight. On a fully
    /// successful batch exactly the submitted items are removed. A second
    /// call is rejected until the first one has released its items.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let Ok(_submitting) = self.submitting.try_lock() else {
            warn!("Rejected submit while a batch is settling");
            return Err(UploadError::SubmissionInProgress);
        };

        let snapshot = self.selection.lock().await.snapshot();
        let outcome = self.orchestrator.submit(&snapshot).await?;

        if let SubmitOutcome::Settled {
            clear_selection: true,
            ..
        } = &outcome
        {
            let released = self
                .selection
                .lock()
                .await
                .release_submitted(&snapshot.item_ids())
                .await;
            info!(released, "Submitted items removed from selection");
        }

        Ok(outcome)
    }
}
