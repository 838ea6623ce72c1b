//! RocketShoes Cart library.
//!
//! Shopping-cart state for the storefront: add, remove, and re-quantify
//! products, checking every change against live stock and persisting the
//! cart to a local key-value store.
//!
//! # Modules
//!
//! - [`manager`] - The [`CartManager`] handle and its three operations
//! - [`api`] - Stock and catalog lookups, with the HTTP [`StoreApiClient`]
//! - [`storage`] - Key-value stores the cart is persisted to
//! - [`notify`] - Delivery of user-facing notices
//! - [`error`] - Cart error taxonomy and notice messages
//! - [`config`] - Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use rocketshoes_cart::{CartConfig, CartManager, FileStore, StoreApiClient, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let api = Arc::new(StoreApiClient::new(&config.api)?);
//! let cart = CartManager::load(
//!     api.clone(),
//!     api,
//!     Arc::new(FileStore::new(&config.storage_path)),
//!     Arc::new(TracingNotifier),
//!     config.storage_key,
//! );
//!
//! cart.add(ProductId::new(1)).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod notify;
pub mod storage;

pub use api::{ApiError, ProductCatalog, StockLookup, StoreApiClient};
pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::{CartError, CartOperation, Notice, ServiceError};
pub use manager::{CartManager, UpdateAmount};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
