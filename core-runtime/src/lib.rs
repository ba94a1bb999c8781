//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the product uploader core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - API addressing and the shared error envelope
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its configuration type,
//! its logging conventions and the broadcast channel through which auth,
//! selection, upload and catalog activity is published to the host.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use api::{ApiEndpoint, ApiErrorBody, FieldError, FieldErrors};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
