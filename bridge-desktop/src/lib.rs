//! Desktop implementations of the host bridges.
//!
//! - [`ReqwestHttpClient`]: rustls over `reqwest`, multipart bodies streamed
//!   in chunks for progress reporting
//! - [`KeyringSecureStore`] (feature `secure-store`, on by default) and
//!   [`InMemorySecureStore`]
//! - [`TempDirPreviewProvider`]: previews written as files under the user
//!   cache directory
//!
//! `core-runtime` falls back to these when its `desktop-shims` feature is on
//! and the host injects nothing.

mod http;
mod memory_store;
mod preview;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;
pub use memory_store::InMemorySecureStore;
pub use preview::TempDirPreviewProvider;

#[cfg(feature = "secure-store")]
pub use secure_store::{KeyringSecureStore, DEFAULT_SERVICE_NAME};
