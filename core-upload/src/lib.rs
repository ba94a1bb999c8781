//! # Upload Module
//!
//! Bulk product upload: a working set of selected images with editable
//! metadata, and an orchestrator that sends them as a single multipart batch.
//!
//! ## Overview
//!
//! - [`SelectionStore`] holds pending items and their previews
//! - [`UploadOrchestrator`] validates, submits and reconciles one batch at a time
//! - [`ProgressTracker`] turns transport byte counts into `UploadEvent::Progress`
//! - [`UploadWorkflow`] snapshots the store, submits, and drops the submitted
//!   items once the whole batch succeeded

pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod result;
pub mod selection;
pub mod workflow;

pub use error::{ItemViolation, Result, SelectionError, UploadError, UPLOAD_FAILED_MESSAGE};
pub use metadata::{Category, MetadataUpdate, MetadataViolation, ProductMetadata, SkuGenerator};
pub use orchestrator::{SubmitOutcome, UploadOrchestrator, UploadState};
pub use progress::ProgressTracker;
pub use result::{BatchResult, BulkUploadResponse, ItemError};
pub use selection::{
    FilePayload, PendingItem, PendingItemSummary, SelectionSnapshot, SelectionStore, SnapshotEntry,
};
pub use workflow::{SharedSelection, UploadWorkflow};
