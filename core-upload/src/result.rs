//! Reconciliation of the bulk-upload response.

use core_catalog::ProductRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Server body for a 2xx bulk upload. Every field defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkUploadResponse {
    pub total_uploaded: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub products: Vec<ProductRecord>,
    pub errors: Vec<ItemError>,
    pub success: bool,
    pub message: Option<String>,
}

/// Server-reported failure of one item, addressed by its batch position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemError {
    #[serde(rename = "index")]
    pub original_index: usize,
    pub filename: String,
    pub error_message: String,
    pub error_code: Option<String>,
}

/// Outcome of one acknowledged batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub batch_id: String,
    pub total_submitted: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub succeeded_products: Vec<ProductRecord>,
    pub per_item_errors: Vec<ItemError>,
    pub server_message: Option<String>,
}

impl BatchResult {
    /// Inconsistent counts are logged and kept as reported.
    pub fn reconcile(batch_id: impl Into<String>, submitted: usize, response: BulkUploadResponse) -> Self {
        let batch_id = batch_id.into();

        if response.total_uploaded != submitted {
            warn!(
                batch_id = %batch_id,
                submitted,
                reported = response.total_uploaded,
                "Server reported a different batch size"
            );
        }
        let counted = response
            .success_count
            .checked_add(response.failure_count);
        if counted != Some(submitted) {
            warn!(
                batch_id = %batch_id,
                submitted,
                success_count = response.success_count,
                failure_count = response.failure_count,
                "Success and failure counts do not add up"
            );
        }
        if response.products.len() != response.success_count {
            warn!(
                batch_id = %batch_id,
                products = response.products.len(),
                success_count = response.success_count,
                "Product list does not match success count"
            );
        }
        for error in response.errors.iter().filter(|e| e.original_index >= submitted) {
            warn!(
                batch_id = %batch_id,
                index = error.original_index,
                "Item error refers to a position outside the batch"
            );
        }

        Self {
            batch_id,
            total_submitted: submitted,
            success_count: response.success_count,
            failure_count: response.failure_count,
            succeeded_products: response.products,
            per_item_errors: response.errors,
            server_message: response.message.filter(|m| !m.trim().is_empty()),
        }
    }

    /// No item failed.
    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0 && self.per_item_errors.is_empty()
    }

    pub fn error_for(&self, index: usize) -> Option<&ItemError> {
        self.per_item_errors.iter().find(|e| e.original_index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure() {
        let response: BulkUploadResponse = serde_json::from_str(
            r#"{
                "totalUploaded": 3,
                "successCount": 2,
                "failureCount": 1,
                "products": [],
                "errors": [{"index": 1, "filename": "b.png", "errorMessage": "Duplicate SKU", "errorCode": "DUPLICATE_SKU"}],
                "success": false,
                "message": "Uploaded 2 of 3"
            }"#,
        )
        .unwrap();

        let result = BatchResult::reconcile("b-1", 3, response);

        assert!(!result.is_complete_success());
        assert_eq!(result.per_item_errors.len(), 1);
        let error = result.error_for(1).unwrap();
        assert_eq!(error.filename, "b.png");
        assert_eq!(error.error_code.as_deref(), Some("DUPLICATE_SKU"));
        assert!(result.error_for(0).is_none());
        assert_eq!(result.server_message.as_deref(), Some("Uploaded 2 of 3"));
    }

    #[test]
    fn test_missing_fields_default() {
        let response: BulkUploadResponse = serde_json::from_str(r#"{"successCount": 2}"#).unwrap();
        let result = BatchResult::reconcile("b-2", 2, response);

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 0);
        assert!(result.is_complete_success());
        assert!(result.server_message.is_none());
    }

    #[test]
    fn test_errors_without_failure_count_are_not_success() {
        let response = BulkUploadResponse {
            total_uploaded: 1,
            errors: vec![ItemError {
                original_index: 0,
                filename: "a.png".into(),
                error_message: "Image too large".into(),
                error_code: None,
            }],
            ..Default::default()
        };

        assert!(!BatchResult::reconcile("b-3", 1, response).is_complete_success());
    }

    #[test]
    fn test_overflowing_counts_are_kept_as_reported() {
        let response: BulkUploadResponse = serde_json::from_str(
            r#"{"totalUploaded": 1, "successCount": 18446744073709551615, "failureCount": 1}"#,
        )
        .unwrap();

        let result = BatchResult::reconcile("b-4", 1, response);

        assert_eq!(result.success_count, usize::MAX);
        assert_eq!(result.failure_count, 1);
        assert!(!result.is_complete_success());
    }
}
