use bridge_traits::BridgeError;
use core_auth::AuthError;
use core_runtime::FieldErrors;
use thiserror::Error;

/// User-facing text for any batch failure that carries no server message.
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Index {index} out of range for selection of {len} items")]
    OutOfRange { index: usize, len: usize },

    #[error("Preview could not be created: {0}")]
    Preview(#[from] BridgeError),
}

/// Local validation failure for one pending item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemViolation {
    /// Position in the submitted snapshot
    pub index: usize,
    pub filename: String,
    pub field: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("An upload is already in progress")]
    SubmissionInProgress,

    #[error("{} item(s) have invalid metadata", .0.len())]
    InvalidItems(Vec<ItemViolation>),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session unavailable: {0}")]
    Session(#[source] AuthError),

    /// No response was received. The message is generic and user-facing.
    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    FieldValidation {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl From<AuthError> for UploadError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => UploadError::NotAuthenticated,
            other => UploadError::Session(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
