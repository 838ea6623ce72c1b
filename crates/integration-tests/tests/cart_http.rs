//! Cart manager against the HTTP client and the file store.
//!
//! Every test spawns its own [`TestApi`] and writes to its own temporary
//! directory, so they run in parallel without interfering.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use rocketshoes_cart::{
    ApiConfig, ApiError, CartError, CartManager, ChannelNotifier, FileStore, KeyValueStore,
    Notice, ServiceError, StoreApiClient, UpdateAmount, config::DEFAULT_STORAGE_KEY,
};
use rocketshoes_core::{CurrencyCode, ProductId};
use rocketshoes_integration_tests::TestApi;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

struct Shop {
    api: TestApi,
    dir: TempDir,
}

impl Shop {
    async fn start() -> Self {
        Self {
            api: TestApi::spawn().await,
            dir: TempDir::new().unwrap(),
        }
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.path().join("storage.json")
    }

    fn config(&self) -> ApiConfig {
        ApiConfig::new(&self.api.url()).unwrap()
    }

    fn open(&self, config: &ApiConfig) -> (CartManager, UnboundedReceiver<Notice>) {
        let client = Arc::new(StoreApiClient::new(config).unwrap());
        let store = Arc::new(FileStore::new(self.storage_path()));
        let (notifier, notices) = ChannelNotifier::new();
        let manager = CartManager::load(
            client.clone(),
            client,
            store,
            Arc::new(notifier),
            DEFAULT_STORAGE_KEY,
        );
        (manager, notices)
    }

    /// The persisted cart, parsed from the storage file.
    fn stored_cart(&self) -> Value {
        let raw = FileStore::new(self.storage_path())
            .get(DEFAULT_STORAGE_KEY)
            .unwrap()
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

fn id(value: i64) -> ProductId {
    ProductId::new(value)
}

#[tokio::test]
async fn test_added_products_survive_a_restart() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);
    shop.api.stock_product(2, "Tênis VR Caminhada", 139.9, 5);

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(1)).await;
    cart.add(id(2)).await;
    cart.add(id(1)).await;
    assert!(notices.try_recv().is_err());

    let (reopened, _) = shop.open(&shop.config());
    assert_eq!(reopened.cart(), cart.cart());

    let summary = reopened.cart().summary(CurrencyCode::BRL);
    assert_eq!(summary.item_count, 3);
    assert_eq!(summary.total, "R$499.70");
    assert_eq!(
        reopened.cart().get(id(1)).map(|entry| entry.amount),
        Some(2)
    );
}

#[tokio::test]
async fn test_out_of_stock_product_is_not_added() {
    let shop = Shop::start().await;
    shop.api.stock_product(7, "Tênis Esgotado", 99.9, 0);

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(7)).await;

    let notice = notices.try_recv().unwrap();
    assert!(matches!(notice.error(), CartError::OutOfStock(p) if *p == id(7)));
    assert_eq!(notice.message(), "Produto sem estoque!");
    assert!(cart.cart().is_empty());
    assert!(!shop.storage_path().exists());
}

#[tokio::test]
async fn test_server_error_is_reported_as_unexpected() {
    let shop = Shop::start().await;
    shop.api.stock_product(3, "Tênis Instável", 120.0, 4);
    shop.api.fail(3);

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(3)).await;

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.message(), "Erro na adição do produto");
    match notice.into_error() {
        CartError::Unexpected {
            source: ServiceError::Api(ApiError::Api { status, .. }),
            ..
        } => assert_eq!(status, 500),
        other => panic!("Expected API error, got {other:?}"),
    }
    assert!(cart.cart().is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_reported_as_not_found() {
    let shop = Shop::start().await;

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(404)).await;

    let notice = notices.try_recv().unwrap();
    assert!(matches!(
        notice.error(),
        CartError::Unexpected {
            source: ServiceError::Api(ApiError::NotFound(_)),
            ..
        }
    ));
}

#[tokio::test]
async fn test_update_beyond_stock_is_rejected() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(1)).await;
    cart.update_amount(UpdateAmount {
        product_id: id(1),
        amount: 4,
    })
    .await;

    let notice = notices.try_recv().unwrap();
    assert!(matches!(
        notice.error(),
        CartError::InsufficientStock {
            requested: 4,
            available: 3,
            ..
        }
    ));
    assert_eq!(notice.message(), "Quantidade solicitada fora de estoque");
    assert_eq!(shop.stored_cart()[0]["amount"], 1);

    cart.update_amount(UpdateAmount {
        product_id: id(1),
        amount: 3,
    })
    .await;
    assert!(notices.try_recv().is_err());
    assert_eq!(shop.stored_cart()[0]["amount"], 3);
}

#[tokio::test]
async fn test_remove_then_re_add_uses_catalog_cache() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);

    let (cart, _) = shop.open(&shop.config());
    cart.add(id(1)).await;
    cart.remove(id(1));
    cart.add(id(1)).await;

    assert_eq!(cart.cart().len(), 1);
    assert_eq!(shop.api.product_requests(), 1);
}

#[tokio::test]
async fn test_catalog_cache_can_be_disabled() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);

    let mut config = shop.config();
    config.catalog_cache_ttl = None;

    let (cart, _) = shop.open(&config);
    cart.add(id(1)).await;
    cart.remove(id(1));
    cart.add(id(1)).await;

    assert_eq!(shop.api.product_requests(), 2);
}

#[tokio::test]
async fn test_extra_product_attributes_are_persisted() {
    let shop = Shop::start().await;
    shop.api.add_product(json!({
        "id": 9,
        "title": "Tênis Trail",
        "price": 249.9,
        "image": "https://cdn.rocketshoes.test/9.jpg",
        "brand": "Rocket",
        "sizes": [38, 39, 40],
    }));
    shop.api.set_stock(9, 2);

    let (cart, _) = shop.open(&shop.config());
    cart.add(id(9)).await;

    let stored = shop.stored_cart();
    assert_eq!(stored[0]["id"], 9);
    assert_eq!(stored[0]["amount"], 1);
    assert_eq!(stored[0]["brand"], "Rocket");
    assert_eq!(stored[0]["sizes"], json!([38, 39, 40]));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);

    let mut config = shop.config();
    config.token = Some(SecretString::from("s3cr3t".to_string()));

    let (cart, _) = shop.open(&config);
    cart.add(id(1)).await;

    assert_eq!(
        shop.api.last_authorization().as_deref(),
        Some("Bearer s3cr3t")
    );
}

#[tokio::test]
async fn test_remove_missing_product_leaves_file_untouched() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);

    let (cart, mut notices) = shop.open(&shop.config());
    cart.add(id(1)).await;
    let before = shop.stored_cart();

    cart.remove(id(2));

    let notice = notices.try_recv().unwrap();
    assert!(matches!(notice.error(), CartError::ProductNotInCart(_)));
    assert_eq!(notice.message(), "Erro na remoção do produto");
    assert_eq!(shop.stored_cart(), before);
}

#[tokio::test]
async fn test_corrupt_storage_file_is_replaced_by_next_edit() {
    let shop = Shop::start().await;
    shop.api.stock_product(1, "Tênis de Caminhada Leve", 179.9, 3);
    std::fs::write(shop.storage_path(), "{garbage").unwrap();

    let (cart, mut notices) = shop.open(&shop.config());
    assert!(cart.cart().is_empty());

    cart.add(id(1)).await;

    assert!(notices.try_recv().is_err());
    assert_eq!(cart.cart().len(), 1);
    assert_eq!(shop.stored_cart()[0]["id"], 1);
    assert_eq!(shop.stored_cart()[0]["amount"], 1);
}

#[tokio::test]
async fn test_catalog_amount_attribute_does_not_break_rehydration() {
    let shop = Shop::start().await;
    shop.api.add_product(json!({
        "id": 4,
        "title": "Tênis Estoque Antigo",
        "price": 89.9,
        "image": "https://cdn.rocketshoes.test/4.jpg",
        "amount": 7,
    }));
    shop.api.set_stock(4, 5);

    let (cart, _) = shop.open(&shop.config());
    cart.add(id(4)).await;

    let (reopened, _) = shop.open(&shop.config());
    assert_eq!(reopened.cart(), cart.cart());
    assert_eq!(reopened.cart().get(id(4)).map(|e| e.amount), Some(1));
}
