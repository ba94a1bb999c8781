//! Text shown to the user for selections, batch results and failures.

use crate::error::CoreError;
use core_auth::AuthError;
use core_catalog::CatalogError;
use core_runtime::{FieldError, FieldErrors};
use core_upload::{
    BatchResult, ItemError, ItemViolation, SelectionError, UploadError, UPLOAD_FAILED_MESSAGE,
};

const SIGN_IN_REQUIRED_MESSAGE: &str = "Please log in to continue";

/// "1 item", "3 items", "0 items".
pub fn item_count_label(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", count)
    }
}

/// Label of the submit control.
pub fn submit_button_label(count: usize, uploading: bool) -> String {
    if uploading {
        return "Uploading...".to_string();
    }
    let plural = if count > 1 { "s" } else { "" };
    format!("Upload {} Product{}", count, plural)
}

/// Field-error key of one item's metadata field, e.g. `items[2].price`.
pub fn item_field_key(index: usize, field: &str) -> String {
    format!("items[{}].{}", index, field)
}

fn violation_field_errors(violations: &[ItemViolation]) -> FieldErrors {
    FieldErrors::new(
        violations
            .iter()
            .map(|v| FieldError {
                field: item_field_key(v.index, v.field),
                message: v.message.clone(),
                rejected_value: None,
            })
            .collect(),
    )
}

/// Rendering of a settled batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// Present when at least one product was stored.
    pub success_message: Option<String>,
    /// Present when at least one item failed.
    pub failure_heading: Option<String>,
    pub failures: Vec<ItemError>,
}

impl UploadSummary {
    pub fn from_result(result: &BatchResult) -> Self {
        let success_message = (result.success_count > 0).then(|| {
            format!(
                "Successfully uploaded {} of {} products",
                result.success_count, result.total_submitted
            )
        });

        let failed = result.failure_count.max(result.per_item_errors.len());
        let failure_heading = (failed > 0).then(|| {
            let plural = if failed > 1 { "s" } else { "" };
            format!("{} Upload{} Failed", failed, plural)
        });

        Self {
            success_message,
            failure_heading,
            failures: result.per_item_errors.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// A failure converted into something a UI can show.
#[derive(Debug, Clone, PartialEq)]
pub struct UserNotice {
    pub severity: NoticeSeverity,
    pub message: String,
    /// Per-field messages for form validation failures.
    pub field_errors: Option<FieldErrors>,
}

impl UserNotice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            ..Self::error(message)
        }
    }

    fn with_field_errors(message: &str, field_errors: &FieldErrors) -> Self {
        Self {
            field_errors: Some(field_errors.clone()),
            ..Self::error(message)
        }
    }
}

impl From<&AuthError> for UserNotice {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::FieldValidation {
                message,
                field_errors,
            } => UserNotice::with_field_errors(message, field_errors),
            AuthError::NotAuthenticated | AuthError::SessionCorrupted => {
                UserNotice::warning(SIGN_IN_REQUIRED_MESSAGE)
            }
            AuthError::SignInInProgress => UserNotice {
                severity: NoticeSeverity::Info,
                ..UserNotice::error(err.to_string())
            },
            other => UserNotice::error(other.to_string()),
        }
    }
}

impl From<&UploadError> for UserNotice {
    fn from(err: &UploadError) -> Self {
        match err {
            UploadError::SubmissionInProgress => UserNotice::warning(err.to_string()),
            UploadError::InvalidItems(violations) => UserNotice {
                field_errors: Some(violation_field_errors(violations)),
                ..UserNotice::warning(err.to_string())
            },
            UploadError::NotAuthenticated => UserNotice::error(SIGN_IN_REQUIRED_MESSAGE),
            UploadError::FieldValidation {
                message,
                field_errors,
            } => UserNotice::with_field_errors(message, field_errors),
            UploadError::Transport(message) | UploadError::Rejected { message, .. } => {
                UserNotice::error(message.clone())
            }
            UploadError::Session(_) | UploadError::InvalidResponse(_) => {
                UserNotice::error(UPLOAD_FAILED_MESSAGE)
            }
        }
    }
}

impl From<&CatalogError> for UserNotice {
    fn from(err: &CatalogError) -> Self {
        match err {
            CatalogError::NotAuthenticated => UserNotice::warning(SIGN_IN_REQUIRED_MESSAGE),
            CatalogError::Rejected { message, .. } => UserNotice::error(message.clone()),
            other => UserNotice::error(other.to_string()),
        }
    }
}

impl From<&SelectionError> for UserNotice {
    fn from(err: &SelectionError) -> Self {
        UserNotice::warning(err.to_string())
    }
}

impl From<&CoreError> for UserNotice {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::Auth(e) => e.into(),
            CoreError::Catalog(e) => e.into(),
            CoreError::Selection(e) => e.into(),
            CoreError::Upload(e) => e.into(),
            CoreError::InitializationFailed(_) => UserNotice::error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_runtime::api::ApiErrorBody;

    fn result(success: usize, failure: usize, errors: Vec<ItemError>) -> BatchResult {
        BatchResult {
            batch_id: "b".into(),
            total_submitted: success + failure,
            success_count: success,
            failure_count: failure,
            succeeded_products: Vec::new(),
            per_item_errors: errors,
            server_message: None,
        }
    }

    fn item_error(index: usize) -> ItemError {
        ItemError {
            original_index: index,
            filename: format!("{}.png", index),
            error_message: "Duplicate SKU".into(),
            error_code: Some("DUPLICATE_SKU".into()),
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(item_count_label(0), "0 items");
        assert_eq!(item_count_label(1), "1 item");
        assert_eq!(item_count_label(4), "4 items");

        assert_eq!(submit_button_label(1, false), "Upload 1 Product");
        assert_eq!(submit_button_label(3, false), "Upload 3 Products");
        assert_eq!(submit_button_label(3, true), "Uploading...");
    }

    #[test]
    fn test_partial_summary() {
        let summary = UploadSummary::from_result(&result(2, 1, vec![item_error(1)]));

        assert_eq!(
            summary.success_message.as_deref(),
            Some("Successfully uploaded 2 of 3 products")
        );
        assert_eq!(summary.failure_heading.as_deref(), Some("1 Upload Failed"));
        assert_eq!(summary.failures.len(), 1);
    }

    #[test]
    fn test_all_failed_summary() {
        let summary =
            UploadSummary::from_result(&result(0, 2, vec![item_error(0), item_error(1)]));

        assert!(summary.success_message.is_none());
        assert_eq!(summary.failure_heading.as_deref(), Some("2 Uploads Failed"));
    }

    #[test]
    fn test_full_success_summary() {
        let summary = UploadSummary::from_result(&result(3, 0, Vec::new()));
        assert_eq!(
            summary.success_message.as_deref(),
            Some("Successfully uploaded 3 of 3 products")
        );
        assert!(summary.failure_heading.is_none());
    }

    #[test]
    fn test_upload_error_notices() {
        let notice = UserNotice::from(&UploadError::Transport(UPLOAD_FAILED_MESSAGE.into()));
        assert_eq!(notice.message, "Upload failed");
        assert_eq!(notice.severity, NoticeSeverity::Error);

        let notice = UserNotice::from(&UploadError::SubmissionInProgress);
        assert_eq!(notice.severity, NoticeSeverity::Warning);

        let body = ApiErrorBody::parse(
            br#"{"fieldErrors":[{"field":"files","message":"At least one file is required"}]}"#,
        )
        .unwrap();
        let notice = UserNotice::from(&UploadError::FieldValidation {
            message: body.message_or("Please fix the errors below"),
            field_errors: body.field_errors(),
        });
        assert_eq!(notice.message, "Please fix the errors below");
        assert_eq!(
            notice.field_errors.unwrap().message_for("files"),
            Some("At least one file is required")
        );
    }

    #[test]
    fn test_invalid_items_keep_each_violation() {
        let err = UploadError::InvalidItems(vec![
            ItemViolation {
                index: 0,
                filename: "a.png".into(),
                field: "name",
                message: "Name is required".into(),
            },
            ItemViolation {
                index: 2,
                filename: "c.png".into(),
                field: "price",
                message: "Price must not be negative".into(),
            },
        ]);

        let notice = UserNotice::from(&err);

        assert_eq!(notice.severity, NoticeSeverity::Warning);
        assert_eq!(notice.message, "2 item(s) have invalid metadata");
        let field_errors = notice.field_errors.unwrap();
        assert_eq!(field_errors.len(), 2);
        assert_eq!(
            field_errors.message_for(&item_field_key(0, "name")),
            Some("Name is required")
        );
        assert_eq!(
            field_errors.message_for("items[2].price"),
            Some("Price must not be negative")
        );
        assert!(field_errors.message_for("items[1].name").is_none());
    }

    #[test]
    fn test_auth_error_notice_uses_server_text() {
        let notice = UserNotice::from(&AuthError::AuthenticationFailed(
            "Invalid username or password".into(),
        ));
        assert_eq!(notice.message, "Invalid username or password");

        let notice = UserNotice::from(&CoreError::Auth(AuthError::NotAuthenticated));
        assert_eq!(notice.message, SIGN_IN_REQUIRED_MESSAGE);
    }
}
