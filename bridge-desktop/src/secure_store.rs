//! OS keychain backed [`SecureStore`].

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SecureStore,
};
use keyring::Entry;
use tracing::{debug, warn};

/// Keychain service under which the session is stored.
pub const DEFAULT_SERVICE_NAME: &str = "product-uploader";

/// Stores secrets in the macOS Keychain, Windows Credential Manager or the
/// Linux Secret Service, depending on the platform.
///
/// Keyring entries hold text, so values are base64 encoded.
pub struct KeyringSecureStore {
    service: String,
}

impl KeyringSecureStore {
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service_name(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).map_err(keyring_error)
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

fn keyring_error(e: keyring::Error) -> BridgeError {
    BridgeError::OperationFailed(format!("Keyring error: {}", e))
}

fn decode(key: &str, encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        warn!(key, error = %e, "Keyring entry is not valid base64");
        BridgeError::OperationFailed(format!("Stored secret is unreadable: {}", e))
    })
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entry(key)?
            .set_password(&STANDARD.encode(value))
            .map_err(keyring_error)?;
        debug!(key, "Secret written to keyring");
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(key)?.get_password() {
            Ok(encoded) => decode(key, &encoded).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error(e)),
        }
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                debug!(key, "Secret removed from keyring");
                Ok(())
            }
            Err(e) => Err(keyring_error(e)),
        }
    }
}
