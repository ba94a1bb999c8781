//! # Selection Store
//!
//! Ordered working set of files waiting to be uploaded, each with editable
//! metadata and an exclusively owned preview.
//!
//! Every item holds exactly one live preview. Items leave the set only through
//! [`SelectionStore::remove_item`], [`SelectionStore::clear`] or
//! [`SelectionStore::release_submitted`], all of which release the preview.

use crate::error::SelectionError;
use crate::metadata::{MetadataUpdate, ProductMetadata, SkuGenerator};
use bridge_traits::preview::{PreviewHandle, PreviewProvider};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, SelectionEvent};
use core_runtime::logging::file_name_only;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, SelectionError>;

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// One entry of the working set.
#[derive(Debug)]
pub struct PendingItem {
    id: Uuid,
    file: FilePayload,
    preview: PreviewHandle,
    metadata: ProductMetadata,
}

impl PendingItem {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &FilePayload {
        &self.file
    }

    pub fn preview_uri(&self) -> &str {
        self.preview.uri()
    }

    pub fn metadata(&self) -> &ProductMetadata {
        &self.metadata
    }
}

/// What remains of an item after removal; its preview is already released.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItemSummary {
    pub id: Uuid,
    pub file_name: String,
    pub metadata: ProductMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub item_id: Uuid,
    pub file: FilePayload,
    pub metadata: ProductMetadata,
}

/// Immutable copy of the working set taken at submit time.
///
/// File content is reference counted, so taking a snapshot copies no image bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl SelectionSnapshot {
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn item_ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|e| e.item_id).collect()
    }

    /// Sum of file sizes.
    pub fn total_file_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.file.size()).sum()
    }
}

pub struct SelectionStore {
    preview_provider: Arc<dyn PreviewProvider>,
    sku_generator: SkuGenerator,
    event_bus: EventBus,
    items: Vec<PendingItem>,
}

impl SelectionStore {
    pub fn new(preview_provider: Arc<dyn PreviewProvider>, event_bus: EventBus) -> Self {
        Self::with_sku_generator(preview_provider, event_bus, SkuGenerator::default())
    }

    pub fn with_sku_generator(
        preview_provider: Arc<dyn PreviewProvider>,
        event_bus: EventBus,
        sku_generator: SkuGenerator,
    ) -> Self {
        Self {
            preview_provider,
            sku_generator,
            event_bus,
            items: Vec::new(),
        }
    }

    /// Appends every image in `files`, in order, with default metadata.
    ///
    /// Non-image files are skipped. Returns the number of items added.
    ///
    /// # Errors
    ///
    /// `SelectionError::Preview` if a preview cannot be allocated. Items
    /// accepted before the failure stay in the set.
    #[instrument(skip(self, files), fields(offered = files.len()))]
    pub async fn add_files(&mut self, files: Vec<FilePayload>) -> Result<usize> {
        let offered = files.len();
        let images: Vec<FilePayload> = files
            .into_iter()
            .filter(|file| {
                if !file.is_image() {
                    debug!(
                        file = file_name_only(&file.name),
                        mime_type = %file.mime_type,
                        "Skipping non-image file"
                    );
                }
                file.is_image()
            })
            .collect();
        let rejected = offered - images.len();

        let mut skus = self.sku_generator.generate_distinct(images.len()).into_iter();
        let mut accepted = 0;
        let mut failure = None;

        for file in images {
            let preview = match self
                .preview_provider
                .create_preview(&file.name, &file.mime_type, &file.content)
                .await
            {
                Ok(preview) => preview,
                Err(e) => {
                    warn!(file = file_name_only(&file.name), error = %e, "Preview allocation failed");
                    failure = Some(e);
                    break;
                }
            };

            let sku = skus.next().unwrap_or_else(|| self.sku_generator.generate());
            let metadata = ProductMetadata::for_file(&file.name, sku);
            self.items.push(PendingItem {
                id: Uuid::new_v4(),
                file,
                preview,
                metadata,
            });
            accepted += 1;
        }

        self.emit(SelectionEvent::ItemsAdded {
            accepted,
            rejected,
            total: self.items.len(),
        });
        info!(accepted, rejected, total = self.items.len(), "Files added");

        match failure {
            Some(e) => Err(SelectionError::Preview(e)),
            None => Ok(accepted),
        }
    }

    /// Removes the item at `index` and releases its preview.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, index: usize) -> Result<PendingItemSummary> {
        if index >= self.items.len() {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let item = self.items.remove(index);
        let summary = PendingItemSummary {
            id: item.id,
            file_name: item.file.name,
            metadata: item.metadata,
        };
        self.release(item.preview).await;

        self.emit(SelectionEvent::ItemRemoved {
            index,
            total: self.items.len(),
        });
        Ok(summary)
    }

    /// Replaces one metadata field of the item at `index`. No validation.
    pub fn update_metadata(&mut self, index: usize, update: MetadataUpdate) -> Result<()> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(SelectionError::OutOfRange { index, len })?;

        debug!(index, field = update.field(), "Metadata updated");
        item.metadata.apply(update);
        Ok(())
    }

    /// Releases every preview and empties the set.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) -> Result<()> {
        let items = std::mem::take(&mut self.items);
        let released = items.len();
        for item in items {
            self.release(item.preview).await;
        }

        self.emit(SelectionEvent::Cleared {
            released,
            remaining: 0,
        });
        Ok(())
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot::new(
            self.items
                .iter()
                .map(|item| SnapshotEntry {
                    item_id: item.id,
                    file: item.file.clone(),
                    metadata: item.metadata.clone(),
                })
                .collect(),
        )
    }

    /// Drops the items of a successfully submitted snapshot.
    ///
    /// Items added after the snapshot was taken are kept. Returns the number
    /// of items removed.
    #[instrument(skip(self, ids), fields(submitted = ids.len()))]
    pub async fn release_submitted(&mut self, ids: &[Uuid]) -> usize {
        let submitted: HashSet<Uuid> = ids.iter().copied().collect();
        let (done, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| submitted.contains(&item.id));
        self.items = kept;

        let released = done.len();
        for item in done {
            self.release(item.preview).await;
        }

        self.emit(SelectionEvent::Cleared {
            released,
            remaining: self.items.len(),
        });
        released
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PendingItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&PendingItem> {
        self.items.get(index)
    }

    /// Previews currently held by the provider.
    pub fn live_previews(&self) -> usize {
        self.preview_provider.live_count()
    }

    async fn release(&self, preview: PreviewHandle) {
        let id = preview.id();
        if let Err(e) = self.preview_provider.release_preview(preview).await {
            warn!(preview_id = %id, error = %e, "Failed to release preview");
        }
    }

    fn emit(&self, event: SelectionEvent) {
        let _ = self.event_bus.emit(CoreEvent::Selection(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Category;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use rust_decimal::Decimal;
    use std::collections::HashSet as StdHashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingPreviews {
        live: Mutex<StdHashSet<Uuid>>,
        fail_after: Option<usize>,
        created: Mutex<usize>,
    }

    #[async_trait]
    impl PreviewProvider for CountingPreviews {
        async fn create_preview(
            &self,
            file_name: &str,
            _mime_type: &str,
            _content: &Bytes,
        ) -> BridgeResult<PreviewHandle> {
            let mut created = self.created.lock().unwrap();
            if self.fail_after.is_some_and(|limit| *created >= limit) {
                return Err(BridgeError::OperationFailed("disk full".into()));
            }
            *created += 1;
            let id = Uuid::new_v4();
            self.live.lock().unwrap().insert(id);
            Ok(PreviewHandle::new(id, format!("mem://{}", file_name)))
        }

        async fn release_preview(&self, handle: PreviewHandle) -> BridgeResult<()> {
            if self.live.lock().unwrap().remove(&handle.id()) {
                Ok(())
            } else {
                Err(BridgeError::OperationFailed("unknown preview".into()))
            }
        }

        fn live_count(&self) -> usize {
            self.live.lock().unwrap().len()
        }
    }

    fn image(name: &str) -> FilePayload {
        FilePayload::new(name, "image/png", Bytes::from_static(b"\x89PNG"))
    }

    fn store() -> SelectionStore {
        SelectionStore::new(Arc::new(CountingPreviews::default()), EventBus::new(64))
    }

    #[tokio::test]
    async fn test_add_files_keeps_only_images_in_order() {
        let mut store = store();
        let files = vec![
            image("a.png"),
            FilePayload::new("notes.txt", "text/plain", Bytes::from_static(b"hi")),
            image("b.jpg"),
            FilePayload::new("clip.mp4", "video/mp4", Bytes::new()),
        ];

        assert_eq!(store.add_files(files).await.unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.items()[0].metadata().name, "a");
        assert_eq!(store.items()[1].metadata().name, "b");
        assert_eq!(store.live_previews(), 2);
    }

    #[tokio::test]
    async fn test_default_skus_are_distinct_within_a_call() {
        let mut store = store();
        let files = (0..25).map(|i| image(&format!("{}.png", i))).collect();
        store.add_files(files).await.unwrap();

        let skus: StdHashSet<_> = store.items().iter().map(|i| i.metadata().sku.clone()).collect();
        assert_eq!(skus.len(), 25);
    }

    #[tokio::test]
    async fn test_live_previews_track_selection_size() {
        let mut store = store();
        store
            .add_files((0..5).map(|i| image(&format!("{}.png", i))).collect())
            .await
            .unwrap();
        assert_eq!(store.live_previews(), store.len());

        let removed = store.remove_item(1).await.unwrap();
        assert_eq!(removed.file_name, "1.png");
        assert_eq!(store.live_previews(), store.len());

        store.remove_item(0).await.unwrap();
        store.add_files(vec![image("x.png")]).await.unwrap();
        assert_eq!(store.live_previews(), store.len());
        assert_eq!(store.len(), 4);

        store.clear().await.unwrap();
        assert_eq!(store.live_previews(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_remove_out_of_range() {
        let mut store = store();
        store.add_files(vec![image("a.png")]).await.unwrap();

        assert!(matches!(
            store.remove_item(3).await,
            Err(SelectionError::OutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_metadata_field() {
        let mut store = store();
        store.add_files(vec![image("a.png")]).await.unwrap();

        store
            .update_metadata(0, MetadataUpdate::Price(Decimal::new(1999, 2)))
            .unwrap();
        store
            .update_metadata(0, MetadataUpdate::Category(Category::Toys))
            .unwrap();

        let metadata = store.get(0).unwrap().metadata();
        assert_eq!(metadata.price, Decimal::new(1999, 2));
        assert_eq!(metadata.category, Category::Toys);
        assert!(store
            .update_metadata(1, MetadataUpdate::Name("x".into()))
            .is_err());
    }

    #[tokio::test]
    async fn test_release_submitted_keeps_later_items() {
        let mut store = store();
        store
            .add_files(vec![image("a.png"), image("b.png")])
            .await
            .unwrap();
        let snapshot = store.snapshot();
        store.add_files(vec![image("c.png")]).await.unwrap();

        let released = store.release_submitted(&snapshot.item_ids()).await;

        assert_eq!(released, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().file().name, "c.png");
        assert_eq!(store.live_previews(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_independent_of_later_edits() {
        let mut store = store();
        store.add_files(vec![image("a.png")]).await.unwrap();
        let snapshot = store.snapshot();

        store
            .update_metadata(0, MetadataUpdate::Name("renamed".into()))
            .unwrap();

        assert_eq!(snapshot.entries()[0].metadata.name, "a");
        assert_eq!(snapshot.total_file_bytes(), 4);
    }

    #[tokio::test]
    async fn test_preview_failure_keeps_earlier_items() {
        let provider = Arc::new(CountingPreviews {
            fail_after: Some(1),
            ..Default::default()
        });
        let mut store = SelectionStore::new(provider, EventBus::new(8));

        let result = store.add_files(vec![image("a.png"), image("b.png")]).await;

        assert!(matches!(result, Err(SelectionError::Preview(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.live_previews(), 1);
    }

    #[tokio::test]
    async fn test_events_published() {
        let event_bus = EventBus::new(16);
        let mut events = event_bus.subscribe();
        let mut store = SelectionStore::new(Arc::new(CountingPreviews::default()), event_bus);

        store
            .add_files(vec![
                image("a.png"),
                FilePayload::new("a.pdf", "application/pdf", Bytes::new()),
            ])
            .await
            .unwrap();
        store.remove_item(0).await.unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Selection(SelectionEvent::ItemsAdded {
                accepted: 1,
                rejected: 1,
                total: 1
            })
        );
        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Selection(SelectionEvent::ItemRemoved { index: 0, total: 0 })
        );
    }
}
