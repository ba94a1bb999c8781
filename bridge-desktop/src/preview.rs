//! File-backed image previews
//!
//! Each preview is the selected image written to a cache directory so a
//! desktop UI can load it by `file://` URI. Releasing a preview deletes the file.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    preview::{PreviewHandle, PreviewProvider},
};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct TempDirPreviewProvider {
    root: PathBuf,
    live: Mutex<HashMap<Uuid, PathBuf>>,
}

impl TempDirPreviewProvider {
    /// Previews under the platform cache directory.
    pub fn new() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("product-uploader")
            .join("previews");
        Self::with_root(root)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn extension_for(file_name: &str, mime_type: &str) -> String {
        match mime_type {
            "image/jpeg" => "jpg".to_string(),
            "image/png" => "png".to_string(),
            "image/gif" => "gif".to_string(),
            "image/webp" => "webp".to_string(),
            _ => Path::new(file_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase())
                .unwrap_or_else(|| "img".to_string()),
        }
    }

    fn lock_error() -> BridgeError {
        BridgeError::OperationFailed("Preview registry lock poisoned".to_string())
    }
}

impl Default for TempDirPreviewProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreviewProvider for TempDirPreviewProvider {
    async fn create_preview(
        &self,
        file_name: &str,
        mime_type: &str,
        content: &Bytes,
    ) -> Result<PreviewHandle> {
        fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4();
        let path = self
            .root
            .join(format!("{}.{}", id, Self::extension_for(file_name, mime_type)));
        fs::write(&path, content).await?;

        let uri = format!("file://{}", path.display());
        self.live
            .lock()
            .map_err(|_| Self::lock_error())?
            .insert(id, path);

        debug!(preview_id = %id, bytes = content.len(), "Created preview");
        Ok(PreviewHandle::new(id, uri))
    }

    async fn release_preview(&self, handle: PreviewHandle) -> Result<()> {
        let path = self
            .live
            .lock()
            .map_err(|_| Self::lock_error())?
            .remove(&handle.id())
            .ok_or_else(|| {
                BridgeError::OperationFailed(format!("Unknown preview {}", handle.id()))
            })?;

        if let Err(e) = fs::remove_file(&path).await {
            // The handle is gone either way; a leftover file is only disk noise.
            warn!(preview_id = %handle.id(), error = %e, "Failed to delete preview file");
        }

        debug!(preview_id = %handle.id(), "Released preview");
        Ok(())
    }

    fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_file_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TempDirPreviewProvider::with_root(dir.path());

        let handle = provider
            .create_preview("shoe.JPG", "image/jpeg", &Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        let path = dir.path().join(format!("{}.jpg", handle.id()));

        assert!(path.exists());
        assert!(handle.uri().starts_with("file://"));
        assert_eq!(provider.live_count(), 1);

        provider.release_preview(handle).await.unwrap();
        assert!(!path.exists());
        assert_eq!(provider.live_count(), 0);
    }

    #[tokio::test]
    async fn test_release_unknown_handle_fails() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TempDirPreviewProvider::with_root(dir.path());

        let foreign = PreviewHandle::new(Uuid::new_v4(), "file:///nowhere");
        assert!(provider.release_preview(foreign).await.is_err());
    }

    #[test]
    fn test_extension_falls_back_to_file_name() {
        assert_eq!(
            TempDirPreviewProvider::extension_for("scan.TIFF", "image/tiff"),
            "tiff"
        );
        assert_eq!(TempDirPreviewProvider::extension_for("noext", "image/x-raw"), "img");
    }
}
