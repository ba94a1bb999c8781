//! Session Persistence
//!
//! Keeps the signed-in [`Session`] in the platform secure store so that a
//! restarted host comes back signed in.
//!
//! - The session is serialized to JSON under a single key
//! - Token values are never logged
//! - Data that fails to parse is deleted and reported as
//!   [`AuthError::SessionCorrupted`]

use crate::error::{AuthError, Result};
use crate::types::Session;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Secure-store key holding the serialized session.
pub const SESSION_KEY: &str = "session";

#[derive(Clone)]
pub struct SessionStore {
    secure_store: Arc<dyn SecureStore>,
}

impl SessionStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Persist `session`, replacing any previous one.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_vec(session)
            .map_err(|e| AuthError::InvalidResponse(format!("session serialization: {}", e)))?;

        self.secure_store
            .set_secret(SESSION_KEY, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to store session in secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(username = %session.username(), "Session stored securely");
        Ok(())
    }

    /// Load the stored session.
    ///
    /// Returns `Ok(None)` when nobody is signed in.
    pub async fn load(&self) -> Result<Option<Session>> {
        let data = self.secure_store.get_secret(SESSION_KEY).await.map_err(|e| {
            warn!(error = %e, "Failed to read session from secure storage");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!("No stored session");
            return Ok(None);
        };

        match serde_json::from_slice::<Session>(&data) {
            Ok(session) => {
                debug!(username = %session.username(), "Stored session loaded");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, discarding it");
                if let Err(delete_err) = self.secure_store.delete_secret(SESSION_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted session");
                }
                Err(AuthError::SessionCorrupted)
            }
        }
    }

    /// Remove the stored session. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        self.secure_store
            .delete_secret(SESSION_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete session from secure storage");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!("Session removed");
        Ok(())
    }
}
