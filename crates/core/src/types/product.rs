//! Catalog and inventory records returned by the store API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;
use super::price::Price;

/// A product as returned by the catalog.
///
/// Only the attributes the cart needs are typed. `id` and `price` are
/// required; a missing `title` or `image` reads as empty. Anything else the
/// catalog returns is kept in `attributes` and written back out unchanged, so
/// a persisted cart never loses display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Product {
    /// Create a product with no extra display attributes.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            attributes: Map::new(),
        }
    }
}

/// Available inventory for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    /// Units available for purchase.
    pub amount: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_keeps_unknown_attributes() {
        let json = r#"{"id":1,"title":"Tênis de Caminhada","price":179.9,"image":"https://cdn/1.jpg","brand":"Rocket"}"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Price::from_cents(17_990));
        assert_eq!(product.attributes.get("brand"), Some(&Value::from("Rocket")));

        let back: Value = serde_json::to_value(&product).unwrap();
        assert_eq!(back["brand"], "Rocket");
        assert_eq!(back["price"], 179.9);
    }

    #[test]
    fn test_product_without_title_or_image() {
        let product: Product = serde_json::from_str(r#"{"id":2,"price":99.9}"#).unwrap();

        assert_eq!(product.title, "");
        assert_eq!(product.image, "");
        assert!(serde_json::from_str::<Product>(r#"{"id":2,"title":"x"}"#).is_err());
    }

    #[test]
    fn test_stock_deserialize() {
        let stock: Stock = serde_json::from_str(r#"{"id":3,"amount":5}"#).unwrap();
        assert_eq!(stock.id, ProductId::new(3));
        assert_eq!(stock.amount, 5);
    }

    #[test]
    fn test_stock_rejects_negative_amount() {
        assert!(serde_json::from_str::<Stock>(r#"{"id":3,"amount":-1}"#).is_err());
    }
}
