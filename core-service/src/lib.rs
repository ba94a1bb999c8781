//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, secure
//! storage, previews) into the auth, catalog and upload crates. Desktop apps
//! typically enable the `desktop-shims` feature so that any bridge missing
//! from the [`CoreConfig`] falls back to the `bridge-desktop` adapters.
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_service::{CoreConfig, CoreService};
//!
//! let config = CoreConfig::builder().build()?;
//! let core = CoreService::bootstrap(config)?;
//!
//! core.auth().login("jane", "secret").await?;
//! let outcome = core.workflow().submit().await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod presentation;

pub use error::{CoreError, Result};
pub use presentation::{NoticeSeverity, UploadSummary, UserNotice};

pub use core_auth::{AuthManager, Session};
pub use core_catalog::{CatalogClient, Page, PageRequest, ProductRecord};
pub use core_runtime::{CoreConfig, CoreConfigBuilder, EventBus};
pub use core_upload::{
    FilePayload, MetadataUpdate, SelectionStore, SharedSelection, SubmitOutcome, UploadWorkflow,
};

use core_runtime::api::ApiEndpoint;
use core_runtime::events::CoreEvent;
use core_upload::UploadOrchestrator;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::Mutex;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    auth: Arc<AuthManager>,
    catalog: Arc<CatalogClient>,
    workflow: Arc<UploadWorkflow>,
}

impl CoreService {
    /// Validate `config` and assemble every component around one event bus.
    pub fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::new(config.event_buffer_size);
        let api = config.api_endpoint();

        let auth = Arc::new(AuthManager::new(
            config.http_client.clone(),
            config.secure_store.clone(),
            api.clone(),
            event_bus.clone(),
        ));
        let catalog = Arc::new(CatalogClient::new(
            config.http_client.clone(),
            auth.clone(),
            api.clone(),
            event_bus.clone(),
        ));

        let selection: SharedSelection = Arc::new(Mutex::new(SelectionStore::new(
            config.preview_provider.clone(),
            event_bus.clone(),
        )));
        let orchestrator = Arc::new(UploadOrchestrator::new(
            config.http_client.clone(),
            auth.clone(),
            ApiEndpoint::new(api.base_url(), config.upload_timeout),
            event_bus.clone(),
        ));
        let workflow = Arc::new(UploadWorkflow::new(selection, orchestrator));

        info!(api_base_url = %config.api_base_url, "Core service ready");

        Ok(Self {
            config: Arc::new(config),
            event_bus,
            auth,
            catalog,
            workflow,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn catalog(&self) -> &Arc<CatalogClient> {
        &self.catalog
    }

    pub fn workflow(&self) -> &Arc<UploadWorkflow> {
        &self.workflow
    }

    pub fn selection(&self) -> &SharedSelection {
        self.workflow.selection()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Loads the catalog and returns page `page` (0-indexed) at the configured page size.
    pub async fn product_page(&self, page: usize) -> Result<Page<ProductRecord>> {
        let list = self.catalog.list_products().await?;
        Ok(core_catalog::paginate(
            &list.products,
            PageRequest::new(page, self.config.catalog_page_size),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{
        HttpClient, HttpRequest, HttpResponse, MultipartForm, TransferObserver,
    };
    use bridge_traits::preview::{PreviewHandle, PreviewProvider};
    use bridge_traits::SecureStore;
    use bytes::Bytes;
    use core_runtime::events::AuthEvent;
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn execute_multipart(
                &self,
                request: HttpRequest,
                form: MultipartForm,
                observer: Arc<dyn TransferObserver>,
            ) -> BridgeResult<HttpResponse>;
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingPreviews {
        live: AtomicUsize,
    }

    #[async_trait]
    impl PreviewProvider for CountingPreviews {
        async fn create_preview(
            &self,
            _file_name: &str,
            _mime_type: &str,
            _content: &Bytes,
        ) -> BridgeResult<PreviewHandle> {
            self.live.fetch_add(1, Ordering::SeqCst);
            Ok(PreviewHandle::new(uuid::Uuid::new_v4(), "mem://preview"))
        }

        async fn release_preview(&self, _handle: PreviewHandle) -> BridgeResult<()> {
            self.live.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn live_count(&self) -> usize {
            self.live.load(Ordering::SeqCst)
        }
    }

    fn response(status: u16, body: String) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        }
    }

    fn product(id: usize) -> String {
        format!(
            r#"{{"productId":"p-{id}","name":"Item {id}","price":1.5,"category":"Books","sku":"SKU-{id}","imageUrl":"","uploadedBy":"jane","uploadedAt":"2024-01-01T00:00:00Z"}}"#,
            id = id
        )
    }

    fn service(http: MockHttpClient) -> CoreService {
        let config = CoreConfig::builder()
            .api_base_url("http://api.test/api/v1")
            .http_client(Arc::new(http))
            .secure_store(Arc::new(MemoryStore::default()))
            .preview_provider(Arc::new(CountingPreviews::default()))
            .build()
            .unwrap();
        CoreService::bootstrap(config).unwrap()
    }

    #[tokio::test]
    async fn test_login_then_page_through_catalog() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|req| req.url.ends_with("/auth/login"))
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"token":"t","username":"jane","email":"jane@shop.example"}"#.into(),
                ))
            });
        http.expect_execute()
            .withf(|req| req.url.ends_with("/products"))
            .times(1)
            .returning(|_| {
                let products: Vec<_> = (0..14).map(product).collect();
                Ok(response(
                    200,
                    format!(r#"{{"products":[{}],"totalProducts":14}}"#, products.join(",")),
                ))
            });

        let core = service(http);
        let mut events = core.subscribe();

        core.auth().login("jane", "pw").await.unwrap();
        let page = core.product_page(1).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 14);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_previous());
        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Auth(AuthEvent::SigningIn {
                username: "jane".into()
            })
        );
    }

    #[tokio::test]
    async fn test_upload_requires_login() {
        let mut http = MockHttpClient::new();
        http.expect_execute_multipart().times(0);
        let core = service(http);

        core.selection()
            .lock()
            .await
            .add_files(vec![FilePayload::new(
                "a.png",
                "image/png",
                Bytes::from_static(b"png"),
            )])
            .await
            .unwrap();

        let err = CoreError::from(core.workflow().submit().await.unwrap_err());
        let notice = UserNotice::from(&err);
        assert_eq!(notice.severity, NoticeSeverity::Error);
        assert!(matches!(
            err,
            CoreError::Upload(core_upload::UploadError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let mut config = CoreConfig::builder()
            .http_client(Arc::new(MockHttpClient::new()))
            .secure_store(Arc::new(MemoryStore::default()))
            .preview_provider(Arc::new(CountingPreviews::default()))
            .build()
            .unwrap();
        config.catalog_page_size = 0;

        assert!(matches!(
            CoreService::bootstrap(config),
            Err(CoreError::InitializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_catalog_transport_error_surfaces() {
        let mut http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, r#"{"token":"t","username":"jane"}"#.into())));
        http.expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(BridgeError::Transport("offline".into())));
        let core = service(http);

        core.auth().login("jane", "pw").await.unwrap();
        let err = core.product_page(0).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::Catalog(core_catalog::CatalogError::Network(_))
        ));
    }
}
