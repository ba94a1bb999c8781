//! # Authentication Manager
//!
//! Username/password sign-in against the product API.
//!
//! ## Overview
//!
//! The `AuthManager` exchanges credentials for a bearer token, keeps the
//! resulting [`Session`] in the secure store, and publishes [`AuthEvent`]s on
//! the event bus. Other crates call [`AuthManager::require_session`] before
//! every protected request.
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::AuthManager;
//! use core_runtime::{events::EventBus, CoreConfig};
//! use std::sync::Arc;
//!
//! # async fn example(config: CoreConfig) -> core_auth::Result<()> {
//! let event_bus = EventBus::new(100);
//! let manager = AuthManager::new(
//!     config.http_client.clone(),
//!     config.secure_store.clone(),
//!     config.api_endpoint(),
//!     event_bus,
//! );
//!
//! let session = manager.login("jane", "correct horse").await?;
//! println!("Signed in as {}", session.username());
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::session_store::SessionStore;
use crate::types::{AuthResponse, LoginRequest, RegisterRequest, Session};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::SecureStore;
use core_runtime::api::{ApiEndpoint, ApiErrorBody, FIELD_ERRORS_FALLBACK_MESSAGE};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

#[derive(Debug, Clone, Copy)]
enum CredentialFlow {
    Login,
    Register,
}

impl CredentialFlow {
    fn path(self) -> &'static str {
        match self {
            CredentialFlow::Login => LOGIN_PATH,
            CredentialFlow::Register => REGISTER_PATH,
        }
    }

    fn fallback_message(self) -> &'static str {
        match self {
            CredentialFlow::Login => LOGIN_FAILED_MESSAGE,
            CredentialFlow::Register => REGISTRATION_FAILED_MESSAGE,
        }
    }
}

/// Signs users in and out and owns the current [`Session`].
pub struct AuthManager {
    http_client: Arc<dyn HttpClient>,
    endpoint: ApiEndpoint,
    session_store: SessionStore,
    event_bus: EventBus,
    /// Cached session; `None` until loaded or signed in
    current_session: RwLock<Option<Session>>,
    /// Held for the duration of a login/register request
    sign_in_lock: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        secure_store: Arc<dyn SecureStore>,
        endpoint: ApiEndpoint,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            endpoint,
            session_store: SessionStore::new(secure_store),
            event_bus,
            current_session: RwLock::new(None),
            sign_in_lock: Mutex::new(()),
        }
    }

    /// Exchanges credentials for a session and persists it.
    ///
    /// # Errors
    ///
    /// - `AuthError::SignInInProgress` - another login/register is pending
    /// - `AuthError::FieldValidation` - the server rejected individual fields
    /// - `AuthError::AuthenticationFailed` - credentials refused
    /// - `AuthError::Network` - no response was received
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let request = LoginRequest::new(username, password);
        let session = self
            .authenticate(CredentialFlow::Login, username, &request)
            .await?;

        self.emit(AuthEvent::SignedIn {
            username: session.username().to_string(),
        });
        info!("Signed in");
        Ok(session)
    }

    /// Creates an account; on success the new user is signed in.
    #[instrument(skip(self, email, password), fields(username = %username))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        let request = RegisterRequest::new(username, email, password);
        let session = self
            .authenticate(CredentialFlow::Register, username, &request)
            .await?;

        self.emit(AuthEvent::Registered {
            username: session.username().to_string(),
        });
        info!("Registered and signed in");
        Ok(session)
    }

    /// Forgets the current session. Succeeds when nobody is signed in.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let previous = self.current_session.write().await.take();
        self.session_store.clear().await?;

        let username = previous.map(|s| s.username().to_string());
        info!(username = ?username, "Signed out");
        self.emit(AuthEvent::SignedOut { username });
        Ok(())
    }

    /// The signed-in session, restored from secure storage on first use.
    ///
    /// A corrupted stored session is discarded and reported as signed out.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        if let Some(session) = self.current_session.read().await.as_ref() {
            return Ok(Some(session.clone()));
        }

        let mut cached = self.current_session.write().await;
        if cached.is_none() {
            *cached = match self.session_store.load().await {
                Ok(session) => session,
                Err(AuthError::SessionCorrupted) => None,
                Err(e) => return Err(e),
            };
        }
        Ok(cached.clone())
    }

    /// Like [`current_session`](Self::current_session) but fails with
    /// `AuthError::NotAuthenticated` when nobody is signed in.
    pub async fn require_session(&self) -> Result<Session> {
        self.current_session()
            .await?
            .ok_or(AuthError::NotAuthenticated)
    }

    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    async fn authenticate<B: Serialize>(
        &self,
        flow: CredentialFlow,
        username: &str,
        body: &B,
    ) -> Result<Session> {
        let _guard = self.sign_in_lock.try_lock().map_err(|_| {
            warn!("Sign-in already in progress");
            AuthError::SignInInProgress
        })?;

        self.emit(AuthEvent::SigningIn {
            username: username.to_string(),
        });

        match self.exchange(flow, body).await {
            Ok(session) => {
                self.session_store.save(&session).await?;
                *self.current_session.write().await = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                self.emit(AuthEvent::AuthError {
                    message: e.to_string(),
                    recoverable: e.is_recoverable(),
                });
                Err(e)
            }
        }
    }

    async fn exchange<B: Serialize>(&self, flow: CredentialFlow, body: &B) -> Result<Session> {
        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.url(flow.path()))
            .header("Accept", "application/json")
            .timeout(self.endpoint.timeout())
            .json(body)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        let response = self.http_client.execute(request).await.map_err(|e| {
            error!(error = %e, "Auth request failed before a response arrived");
            AuthError::Network(flow.fallback_message().to_string())
        })?;

        if !response.is_success() {
            warn!(status = response.status, "Auth request rejected");
            return Err(failure_from_response(&response, flow.fallback_message()));
        }

        let parsed: AuthResponse = response.json().map_err(|e| {
            error!(error = %e, "Unreadable auth response");
            AuthError::InvalidResponse(e.to_string())
        })?;
        debug!("Auth response parsed");
        Ok(Session::from(parsed))
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.event_bus.emit(CoreEvent::Auth(event));
    }
}

/// Maps a non-2xx auth response to a user-facing error.
fn failure_from_response(response: &HttpResponse, fallback: &str) -> AuthError {
    match ApiErrorBody::parse(&response.body) {
        Some(body) if body.has_field_errors() => AuthError::FieldValidation {
            message: body.message_or(FIELD_ERRORS_FALLBACK_MESSAGE),
            field_errors: body.field_errors(),
        },
        Some(body) => AuthError::AuthenticationFailed(body.message_or(fallback)),
        None => AuthError::AuthenticationFailed(fallback.to_string()),
    }
}
