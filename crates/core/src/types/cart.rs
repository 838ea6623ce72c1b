//! Cart entries, the cart itself, and derived totals.
//!
//! A [`Cart`] is an immutable value: every edit returns a new cart, and the
//! cart manager swaps the whole value in on success. This keeps snapshots
//! handed to renderers stable while an operation is in flight.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{CurrencyCode, Price};
use super::product::Product;

/// A product in the cart together with the quantity the shopper wants.
///
/// Serialized flat: the product attributes plus an `amount` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub product: Product,
    /// Quantity in the cart, always at least 1.
    pub amount: u32,
}

impl CartEntry {
    /// Create an entry with a quantity of one.
    ///
    /// A catalog `amount` attribute is dropped: the entry's own quantity
    /// takes that key when serialized.
    #[must_use]
    pub fn new(mut product: Product) -> Self {
        product.attributes.remove("amount");
        Self { product, amount: 1 }
    }

    /// The product ID for this entry.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Price of the whole line (`price * amount`).
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.amount)
    }
}

/// Ordered list of cart entries, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartEntry>);

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.0
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the entry for a product.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartEntry> {
        self.0.iter().find(|entry| entry.product_id() == product_id)
    }

    /// Whether the cart holds an entry for a product.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// A copy of this cart with `entry` appended.
    ///
    /// Callers are expected to check [`Cart::contains`] first; the cart does
    /// not deduplicate here.
    #[must_use]
    pub fn with_entry(&self, entry: CartEntry) -> Self {
        let mut entries = self.0.clone();
        entries.push(entry);
        Self(entries)
    }

    /// A copy of this cart without the entry for `product_id`.
    #[must_use]
    pub fn without(&self, product_id: ProductId) -> Self {
        Self(
            self.0
                .iter()
                .filter(|entry| entry.product_id() != product_id)
                .cloned()
                .collect(),
        )
    }

    /// A copy of this cart where the entry for `product_id` has `amount`.
    ///
    /// Unmatched IDs leave the copy identical to the original.
    #[must_use]
    pub fn with_amount(&self, product_id: ProductId, amount: u32) -> Self {
        Self(
            self.0
                .iter()
                .map(|entry| {
                    if entry.product_id() == product_id {
                        CartEntry {
                            amount,
                            ..entry.clone()
                        }
                    } else {
                        entry.clone()
                    }
                })
                .collect(),
        )
    }

    /// Total units across all entries.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.0.iter().map(|entry| entry.amount).sum()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.0.iter().map(CartEntry::subtotal).sum()
    }

    /// Display-ready totals for rendering.
    #[must_use]
    pub fn summary(&self, currency: CurrencyCode) -> CartSummary {
        CartSummary {
            lines: self
                .0
                .iter()
                .map(|entry| CartLine {
                    product_id: entry.product_id(),
                    title: entry.product.title.clone(),
                    image: entry.product.image.clone(),
                    amount: entry.amount,
                    price: entry.product.price.display(currency),
                    subtotal: entry.subtotal().display(currency),
                })
                .collect(),
            item_count: self.item_count(),
            total: self.total().display(currency),
        }
    }
}

impl From<Vec<CartEntry>> for Cart {
    fn from(entries: Vec<CartEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartEntry;
    type IntoIter = std::slice::Iter<'a, CartEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub title: String,
    pub image: String,
    pub amount: u32,
    pub price: String,
    pub subtotal: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub total: String,
}
