//! Core types for RocketShoes.
//!
//! This module provides type-safe wrappers for the catalog and cart domain.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartEntry, CartLine, CartSummary};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{Product, Stock};
