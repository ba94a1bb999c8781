use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] core_catalog::CatalogError),

    #[error("Selection error: {0}")]
    Selection(#[from] core_upload::SelectionError),

    #[error("Upload error: {0}")]
    Upload(#[from] core_upload::UploadError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
