use thiserror::Error;

/// Failures raised while assembling the runtime (configuration, logging, bridges).
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is out of range or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bridge was not injected and this build has no default for it.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A default bridge could not be constructed.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
