//! Cart error taxonomy and user-facing notices.
//!
//! Every failed cart operation produces exactly one [`CartError`]. The cart
//! manager never returns it to the caller; it is wrapped in a [`Notice`] and
//! handed to the configured notifier. The user only sees the coarse
//! [`Notice::message`], but the variant stays available to tests and to any
//! UI that wants to react to a specific kind.

use rocketshoes_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Shown when a product with no stock is added.
pub const OUT_OF_STOCK_MESSAGE: &str = "Produto sem estoque!";
/// Shown when adding a product fails for any other reason.
pub const ADD_FAILED_MESSAGE: &str = "Erro na adição do produto";
/// Shown when removing a product fails.
pub const REMOVE_FAILED_MESSAGE: &str = "Erro na remoção do produto";
/// Shown when a quantity change is invalid or fails.
pub const UPDATE_FAILED_MESSAGE: &str = "Erro na alteração de quantidade do produto";
/// Shown when a quantity change asks for more than is in stock.
pub const INSUFFICIENT_STOCK_MESSAGE: &str = "Quantidade solicitada fora de estoque";

/// The cart operation that was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl std::fmt::Display for CartOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::UpdateAmount => write!(f, "update_amount"),
        }
    }
}

/// Failures from the collaborators the cart depends on.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Stock or catalog lookup failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Reading or writing the persisted cart failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The cart could not be serialized for storage.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Why a cart operation did not change the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Stock is zero when the product is first added.
    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    /// The requested quantity is above what is in stock.
    #[error("requested {requested} of product {product_id}, only {available} in stock")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: u32,
    },

    /// The requested quantity is below one.
    #[error("invalid quantity {amount} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, amount: i64 },

    /// Removal of a product the cart does not hold.
    #[error("product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    /// A lookup, network, or storage error.
    #[error("{operation} failed for product {product_id}: {source}")]
    Unexpected {
        operation: CartOperation,
        product_id: ProductId,
        #[source]
        source: ServiceError,
    },
}

impl CartError {
    /// Wrap a collaborator failure for `operation`.
    pub fn unexpected(
        operation: CartOperation,
        product_id: ProductId,
        source: impl Into<ServiceError>,
    ) -> Self {
        Self::Unexpected {
            operation,
            product_id,
            source: source.into(),
        }
    }

    /// The product the failed operation targeted.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        match self {
            Self::OutOfStock(id) | Self::ProductNotInCart(id) => *id,
            Self::InsufficientStock { product_id, .. }
            | Self::InvalidQuantity { product_id, .. }
            | Self::Unexpected { product_id, .. } => *product_id,
        }
    }

    /// Whether this is a collaborator failure rather than a business rule.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Unexpected { .. })
    }

    /// The text shown to the shopper.
    ///
    /// Unexpected failures share the message of the operation they happened
    /// in; an update that cannot read stock reads the same as an invalid
    /// quantity.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::OutOfStock(_) => OUT_OF_STOCK_MESSAGE,
            Self::InsufficientStock { .. } => INSUFFICIENT_STOCK_MESSAGE,
            Self::InvalidQuantity { .. } => UPDATE_FAILED_MESSAGE,
            Self::ProductNotInCart(_) => REMOVE_FAILED_MESSAGE,
            Self::Unexpected { operation, .. } => match operation {
                CartOperation::Add => ADD_FAILED_MESSAGE,
                CartOperation::Remove => REMOVE_FAILED_MESSAGE,
                CartOperation::UpdateAmount => UPDATE_FAILED_MESSAGE,
            },
        }
    }
}

/// A user-visible message about a failed cart operation.
#[derive(Debug)]
pub struct Notice {
    error: CartError,
}

impl Notice {
    /// Create a notice for `error`.
    #[must_use]
    pub const fn new(error: CartError) -> Self {
        Self { error }
    }

    /// The underlying error.
    #[must_use]
    pub const fn error(&self) -> &CartError {
        &self.error
    }

    /// Consume the notice, returning the error.
    #[must_use]
    pub fn into_error(self) -> CartError {
        self.error
    }

    /// The text shown to the shopper.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.error.message()
    }
}

impl From<CartError> for Notice {
    fn from(error: CartError) -> Self {
        Self::new(error)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_per_kind() {
        let id = ProductId::new(1);

        assert_eq!(CartError::OutOfStock(id).message(), "Produto sem estoque!");
        assert_eq!(
            CartError::InsufficientStock {
                product_id: id,
                requested: 5,
                available: 2,
            }
            .message(),
            "Quantidade solicitada fora de estoque"
        );
        assert_eq!(
            CartError::InvalidQuantity {
                product_id: id,
                amount: 0,
            }
            .message(),
            "Erro na alteração de quantidade do produto"
        );
        assert_eq!(
            CartError::ProductNotInCart(id).message(),
            "Erro na remoção do produto"
        );
    }

    #[test]
    fn test_unexpected_message_follows_operation() {
        let id = ProductId::new(2);
        let not_found = || ApiError::NotFound("stock/2".to_string());

        assert_eq!(
            CartError::unexpected(CartOperation::Add, id, not_found()).message(),
            ADD_FAILED_MESSAGE
        );
        assert_eq!(
            CartError::unexpected(CartOperation::Remove, id, not_found()).message(),
            REMOVE_FAILED_MESSAGE
        );
        assert_eq!(
            CartError::unexpected(CartOperation::UpdateAmount, id, not_found()).message(),
            UPDATE_FAILED_MESSAGE
        );
    }

    #[test]
    fn test_error_display() {
        let err = CartError::InsufficientStock {
            product_id: ProductId::new(1),
            requested: 5,
            available: 2,
        };
        assert_eq!(err.to_string(), "requested 5 of product 1, only 2 in stock");

        let err = CartError::unexpected(
            CartOperation::Add,
            ProductId::new(3),
            ApiError::NotFound("products/3".to_string()),
        );
        assert_eq!(err.to_string(), "add failed for product 3: Not found: products/3");
        assert!(err.is_unexpected());
        assert_eq!(err.product_id(), ProductId::new(3));
    }

    #[test]
    fn test_notice_display_is_user_message() {
        let notice = Notice::from(CartError::OutOfStock(ProductId::new(4)));
        assert_eq!(notice.to_string(), OUT_OF_STOCK_MESSAGE);
        assert!(matches!(notice.into_error(), CartError::OutOfStock(_)));
    }
}
