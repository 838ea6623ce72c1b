//! Stock and catalog lookups.
//!
//! # Architecture
//!
//! - The cart only depends on the [`StockLookup`] and [`ProductCatalog`]
//!   traits, so tests and alternative backends can stand in for HTTP
//! - [`StoreApiClient`] is the HTTP implementation of both
//! - Stock is never cached: every call hits the API
//! - Product details are cached via `moka` (configurable TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::api::{ProductCatalog, StockLookup, StoreApiClient};
//!
//! let client = StoreApiClient::new(&config.api)?;
//!
//! let stock = client.stock(ProductId::new(1)).await?;
//! if stock.amount > 0 {
//!     let product = client.product(ProductId::new(1)).await?;
//! }
//! ```

mod client;

pub use client::StoreApiClient;

use async_trait::async_trait;
use rocketshoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when talking to the stock or catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Client could not be configured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Source of current stock levels.
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Fetch the available quantity for a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the lookup fails for any reason.
    async fn stock(&self, product_id: ProductId) -> Result<Stock, ApiError>;
}

/// Source of product display details.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product's details.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the lookup fails for any reason.
    async fn product(&self, product_id: ProductId) -> Result<Product, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("stock/9".to_string());
        assert_eq!(err.to_string(), "Not found: stock/9");

        let err = ApiError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
