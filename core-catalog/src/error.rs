use core_auth::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session unavailable: {0}")]
    Session(#[source] AuthError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Catalog request failed ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

impl From<AuthError> for CatalogError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotAuthenticated => CatalogError::NotAuthenticated,
            other => CatalogError::Session(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
