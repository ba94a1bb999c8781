//! Persistence for the signed-in session.

use async_trait::async_trait;

use crate::error::Result;

/// Byte storage for credentials, keyed by a short name such as `"session"`.
///
/// Desktop hosts back this with the OS keychain. Implementations must never
/// log stored values.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Overwrites any existing value under `key`.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removing a missing key succeeds.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}
