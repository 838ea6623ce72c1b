//! HTTP client for the RocketShoes stock and catalog API.
//!
//! Uses `reqwest` for HTTP with JSON bodies parsed by `serde_json`.
//! Caches product details using `moka` (TTL from configuration).

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rocketshoes_core::{Product, ProductId, Stock};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, ProductCatalog, StockLookup};
use crate::config::ApiConfig;

/// Maximum number of products kept in the catalog cache.
const CATALOG_CACHE_CAPACITY: u64 = 1000;

/// Characters of an error body kept for logs and error messages.
const ERROR_BODY_PREVIEW: usize = 200;

// =============================================================================
// StoreApiClient
// =============================================================================

/// Client for the stock and catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct StoreApiClient {
    inner: Arc<StoreApiClientInner>,
}

struct StoreApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    catalog_cache: Option<Cache<ProductId, Product>>,
}

impl StoreApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Config(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let catalog_cache = config.catalog_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(CATALOG_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(StoreApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog_cache,
            }),
        })
    }

    /// The base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Drop every cached product.
    pub fn invalidate_catalog_cache(&self) {
        if let Some(cache) = &self.inner.catalog_cache {
            cache.invalidate_all();
        }
    }

    /// Resolve a resource path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// GET a resource and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let preview = body.chars().take(ERROR_BODY_PREVIEW).collect::<String>();
            tracing::error!(
                status = %status,
                path,
                body = %preview,
                "Store API returned non-success status"
            );
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: preview,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "Failed to parse Store API response"
            );
            ApiError::Parse(e)
        })
    }
}

#[async_trait]
impl StockLookup for StoreApiClient {
    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError> {
        self.get_json(&format!("stock/{product_id}")).await
    }
}

#[async_trait]
impl ProductCatalog for StoreApiClient {
    #[instrument(skip_all, fields(product_id = %product_id))]
    async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        if let Some(cache) = &self.inner.catalog_cache
            && let Some(product) = cache.get(&product_id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{product_id}")).await?;

        if let Some(cache) = &self.inner.catalog_cache {
            cache.insert(product_id, product.clone()).await;
        }

        Ok(product)
    }
}
