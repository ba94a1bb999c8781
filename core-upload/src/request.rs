//! Multipart body for `POST /products/bulk-upload`.

use crate::error::{Result, UploadError};
use crate::metadata::ProductMetadata;
use crate::selection::SelectionSnapshot;
use bridge_traits::http::MultipartForm;

pub const BULK_UPLOAD_PATH: &str = "/products/bulk-upload";
pub const FILES_FIELD: &str = "files";
pub const METADATA_FIELD: &str = "metadata";

/// One `files` part per entry in snapshot order, then a single `metadata`
/// part holding the JSON array of metadata records in the same order.
pub fn build_bulk_upload_form(snapshot: &SelectionSnapshot) -> Result<MultipartForm> {
    let metadata: Vec<&ProductMetadata> = snapshot.entries().iter().map(|e| &e.metadata).collect();
    let metadata_json = serde_json::to_string(&metadata)
        .map_err(|e| UploadError::InvalidResponse(format!("metadata serialization: {}", e)))?;

    let form = snapshot
        .entries()
        .iter()
        .fold(MultipartForm::new(), |form, entry| {
            form.file(
                FILES_FIELD,
                entry.file.name.clone(),
                entry.file.mime_type.clone(),
                entry.file.content.clone(),
            )
        })
        .text(METADATA_FIELD, metadata_json);

    Ok(form)
}
