use core_runtime::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The server rejected one or more form fields.
    #[error("{message}")]
    FieldValidation {
        message: String,
        field_errors: FieldErrors,
    },

    /// The server refused the credentials; the message is user-facing.
    #[error("{0}")]
    AuthenticationFailed(String),

    /// No response was received; the message is user-facing.
    #[error("{0}")]
    Network(String),

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Stored session is corrupted and was discarded")]
    SessionCorrupted,

    #[error("A sign-in request is already in progress")]
    SignInInProgress,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Whether retrying the same action may succeed without user changes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::Network(_) | AuthError::SignInInProgress | AuthError::SecureStorageUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
