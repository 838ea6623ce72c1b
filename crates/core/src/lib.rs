//! RocketShoes Core - Shared cart and catalog types.
//!
//! This crate provides the types shared by every RocketShoes component:
//! - `cart` - Cart state manager and its service clients
//! - `cli` - Command-line front end for inspecting and editing the cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no
//! HTTP clients, no storage. This keeps it lightweight and allows it to be
//! used anywhere, including UI layers that only render cart snapshots.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, products, stock records, and cart entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
