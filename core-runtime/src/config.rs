//! # Core Configuration Module
//!
//! Provides configuration management for the product uploader core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the API location, tuning values and every bridge the
//! core depends on. It enforces fail-fast validation so a misconfigured host
//! learns about it at startup instead of at the first upload.
//!
//! ## Bridges
//!
//! - `HttpClient` - API access (desktop default: reqwest)
//! - `SecureStore` - Session persistence (desktop default: OS keychain)
//! - `PreviewProvider` - Image previews (desktop default: cache directory files)
//!
//! When the `desktop-shims` feature is enabled, missing bridges are filled
//! with the `bridge-desktop` implementations. Without it every bridge must be
//! injected and a missing one is reported as [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .api_base_url("https://products.example.com/api/v1")
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .preview_provider(Arc::new(MyPreviewProvider))
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CoreConfigBuilder::from_env`] seeds the API base URL from
//! `PRODUCT_API_URL` when it is set.

use crate::api::ApiEndpoint;
use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, PreviewProvider, SecureStore};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// API root used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Environment variable consulted by [`CoreConfigBuilder::from_env`].
pub const API_URL_ENV_VAR: &str = "PRODUCT_API_URL";

/// Products shown per catalog page.
pub const DEFAULT_CATALOG_PAGE_SIZE: usize = 12;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart batches carry whole images and get a longer budget.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Core configuration for the product uploader.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// API root without a trailing slash, e.g. `http://localhost:8080/api/v1`
    pub api_base_url: String,

    /// Timeout for JSON requests (auth, catalog)
    pub request_timeout: Duration,

    /// Timeout for a whole multipart batch
    pub upload_timeout: Duration,

    /// Page size for client-side catalog pagination
    pub catalog_page_size: usize,

    /// Event bus buffer per subscriber
    pub event_buffer_size: usize,

    pub http_client: Arc<dyn HttpClient>,

    pub secure_store: Arc<dyn SecureStore>,

    pub preview_provider: Arc<dyn PreviewProvider>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("catalog_page_size", &self.catalog_page_size)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .field("preview_provider", &"PreviewProvider { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Endpoint for JSON requests, carrying `request_timeout`.
    pub fn api_endpoint(&self) -> ApiEndpoint {
        ApiEndpoint::new(self.api_base_url.clone(), self.request_timeout)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The API base URL parses and uses `http` or `https`
    /// - Timeouts are non-zero
    /// - Page and buffer sizes are non-zero
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.api_base_url).map_err(|e| {
            Error::Config(format!(
                "Invalid API base URL '{}': {}",
                self.api_base_url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.request_timeout.is_zero() || self.upload_timeout.is_zero() {
            return Err(Error::Config(
                "Request and upload timeouts must be greater than zero".to_string(),
            ));
        }

        if self.catalog_page_size == 0 {
            return Err(Error::Config(
                "Catalog page size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, purpose: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature to use the default adapter. \
             Other hosts: inject a platform-native implementation.",
            capability, purpose
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::try_with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to build default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing("HttpClient", "API access"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Ok(Arc::new(bridge_desktop::KeyringSecureStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(capability_missing("SecureStore", "session persistence"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_preview_provider() -> Result<Arc<dyn PreviewProvider>> {
    Ok(Arc::new(bridge_desktop::TempDirPreviewProvider::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_preview_provider() -> Result<Arc<dyn PreviewProvider>> {
    Err(capability_missing("PreviewProvider", "image previews"))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    api_base_url: Option<String>,
    request_timeout: Option<Duration>,
    upload_timeout: Option<Duration>,
    catalog_page_size: Option<usize>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    preview_provider: Option<Arc<dyn PreviewProvider>>,
}

impl CoreConfigBuilder {
    /// Builder seeded from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_lookup(|key| std::env::var(key).ok())
    }

    fn from_env_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut builder = Self::default();
        if let Some(url) = lookup(API_URL_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            builder.api_base_url = Some(url);
        }
        builder
    }

    /// Sets the API root. A trailing slash is ignored.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    pub fn catalog_page_size(mut self, size: usize) -> Self {
        self.catalog_page_size = Some(size);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// Desktop builds default to a reqwest-backed client.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the secure store holding the signed-in session.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets the preview provider used by the selection store.
    pub fn preview_provider(mut self, provider: Arc<dyn PreviewProvider>) -> Self {
        self.preview_provider = Some(provider);
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] if a bridge is absent and no default exists
    /// - [`Error::Config`] if validation fails
    pub fn build(self) -> Result<CoreConfig> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };

        let preview_provider = match self.preview_provider {
            Some(provider) => provider,
            None => provide_default_preview_provider()?,
        };

        let api_base_url = self
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();

        let config = CoreConfig {
            api_base_url,
            request_timeout,
            upload_timeout: self.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
            catalog_page_size: self
                .catalog_page_size
                .unwrap_or(DEFAULT_CATALOG_PAGE_SIZE),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            secure_store,
            preview_provider,
        };

        config.validate()?;

        Ok(config)
    }
}
