//! Shared pieces of the product API protocol: endpoint addressing and the
//! JSON error envelope every endpoint returns on failure.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message shown when a failure body carries field errors but no message.
pub const FIELD_ERRORS_FALLBACK_MESSAGE: &str = "Please fix the errors below";

/// API root plus the timeout applied to requests against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    base_url: String,
    timeout: Duration,
}

impl ApiEndpoint {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL for `path`; leading slashes on `path` are optional.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_value: Option<serde_json::Value>,
}

/// Field-level validation failures, looked up by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }

    /// First message reported for `field`, if any.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

/// Failure body: `{ "message": ..., "fieldErrors": [...] }`, both optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub field_errors: Option<Vec<FieldError>>,
}

impl ApiErrorBody {
    /// Parse a failure body. Non-JSON bodies (proxies, HTML error pages) yield `None`.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub fn has_field_errors(&self) -> bool {
        self.field_errors.is_some()
    }

    pub fn field_errors(&self) -> FieldErrors {
        FieldErrors::new(self.field_errors.clone().unwrap_or_default())
    }

    /// Non-blank server message, or `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}
