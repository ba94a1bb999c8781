//! Read access to the product catalog.

use crate::error::{CatalogError, Result};
use crate::models::{ProductList, ProductRecord};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use core_auth::AuthManager;
use core_runtime::api::{ApiEndpoint, ApiErrorBody};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const PRODUCTS_PATH: &str = "/products";
const LOAD_FAILED_MESSAGE: &str = "Failed to load products";

pub struct CatalogClient {
    http_client: Arc<dyn HttpClient>,
    auth: Arc<AuthManager>,
    endpoint: ApiEndpoint,
    event_bus: EventBus,
    retry_policy: RetryPolicy,
}

impl CatalogClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        auth: Arc<AuthManager>,
        endpoint: ApiEndpoint,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            auth,
            endpoint,
            event_bus,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Fetches every product visible to the signed-in user.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<ProductList> {
        let list: ProductList = self.get_json(&self.endpoint.url(PRODUCTS_PATH), None).await?;

        debug!(
            returned = list.products.len(),
            total_products = list.total_products,
            "Products loaded"
        );
        self.emit(CatalogEvent::ProductsLoaded {
            total_products: list.products.len(),
        });
        Ok(list)
    }

    /// Fetches one product by id.
    ///
    /// # Errors
    ///
    /// `CatalogError::NotFound` when the server answers 404.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: &str) -> Result<ProductRecord> {
        let url = self.endpoint.url(&format!(
            "{}/{}",
            PRODUCTS_PATH,
            urlencoding::encode(product_id)
        ));
        let product: ProductRecord = self.get_json(&url, Some(product_id)).await?;

        self.emit(CatalogEvent::ProductLoaded {
            product_id: product.product_id.clone(),
        });
        Ok(product)
    }

    /// Public URL of a product's image. Needs no session.
    pub fn image_url(&self, product_id: &str) -> String {
        image_url(&self.endpoint, product_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, product_id: Option<&str>) -> Result<T> {
        let result = self.fetch(url, product_id).await;
        if let Err(e) = &result {
            self.emit(CatalogEvent::LoadFailed {
                message: e.to_string(),
            });
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, product_id: Option<&str>) -> Result<T> {
        let session = self.auth.require_session().await?;

        let request = HttpRequest::new(HttpMethod::Get, url)
            .header("Accept", "application/json")
            .bearer_token(session.token())
            .timeout(self.endpoint.timeout());

        let response = self
            .http_client
            .execute_with_retry(request, self.retry_policy.clone())
            .await
            .map_err(|e| {
                warn!(error = %e, "Catalog request failed before a response arrived");
                CatalogError::Network(e.to_string())
            })?;

        if !response.is_success() {
            return Err(rejection(&response, product_id));
        }

        response
            .json()
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))
    }

    fn emit(&self, event: CatalogEvent) {
        let _ = self.event_bus.emit(CoreEvent::Catalog(event));
    }
}

/// `{base}/products/{id}/image` with `id` percent-encoded as a path segment.
pub fn image_url(endpoint: &ApiEndpoint, product_id: &str) -> String {
    endpoint.url(&format!(
        "{}/{}/image",
        PRODUCTS_PATH,
        urlencoding::encode(product_id)
    ))
}

fn rejection(response: &HttpResponse, product_id: Option<&str>) -> CatalogError {
    if response.status == 404 {
        if let Some(id) = product_id {
            return CatalogError::NotFound(id.to_string());
        }
    }
    if response.status == 401 {
        return CatalogError::NotAuthenticated;
    }

    let message = ApiErrorBody::parse(&response.body)
        .map(|body| body.message_or(LOAD_FAILED_MESSAGE))
        .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_string());
    warn!(status = response.status, %message, "Catalog request rejected");
    CatalogError::Rejected {
        status: response.status,
        message,
    }
}
