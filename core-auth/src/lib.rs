//! # Authentication Module
//!
//! Username/password sessions for the product API.
//!
//! ## Overview
//!
//! This module signs users in and registers new accounts, stores the
//! resulting bearer token through the platform `SecureStore`, and hands the
//! session to the catalog and upload crates for protected requests.
//!
//! ## Features
//!
//! - Login and registration with server field-error reporting
//! - Session persistence across restarts
//! - Concurrent sign-in protection
//! - Auth state event emission

pub mod error;
pub mod manager;
pub mod session_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{AuthManager, LOGIN_FAILED_MESSAGE, REGISTRATION_FAILED_MESSAGE};
pub use session_store::SessionStore;
pub use types::{AuthResponse, LoginRequest, RegisterRequest, Session};
