//! Preview Resource Abstraction
//!
//! A preview is a host-side resource (object URL, temp file, GPU texture) that
//! lets a UI show a selected image before it is uploaded. Previews are scarce:
//! each one must be released exactly once.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::Result;

/// Exclusive handle to an allocated preview.
///
/// Not `Clone`. Releasing consumes the handle, so each preview is released
/// at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    id: Uuid,
    uri: String,
}

impl PreviewHandle {
    /// Only providers mint handles.
    pub fn new(id: Uuid, uri: impl Into<String>) -> Self {
        Self {
            id,
            uri: uri.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Host-resolvable location of the preview (e.g. `file:///...`, `blob:...`).
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Allocates and releases previews for selected files.
///
/// # Example
///
/// ```ignore
/// let handle = provider.create_preview("shoe.png", "image/png", &bytes).await?;
/// // show handle.uri() ...
/// provider.release_preview(handle).await?;
/// ```
#[async_trait]
pub trait PreviewProvider: Send + Sync {
    /// Allocate a preview for the given image content.
    async fn create_preview(
        &self,
        file_name: &str,
        mime_type: &str,
        content: &Bytes,
    ) -> Result<PreviewHandle>;

    /// Release a preview. Releasing a handle this provider does not know is
    /// reported as [`BridgeError::OperationFailed`](crate::BridgeError).
    async fn release_preview(&self, handle: PreviewHandle) -> Result<()>;

    /// Number of previews currently allocated and not yet released.
    fn live_count(&self) -> usize;
}
