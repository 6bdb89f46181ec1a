//! Febeflo Core - Cart, checkout and payment domain library.
//!
//! This crate provides the pieces shared by every Febeflo component:
//! - `storefront` - HTTP server for the payment handshake and result page
//! - `cli` - Shopper client that owns the cart and drives checkout
//!
//! # Architecture
//!
//! The core crate contains types, state machines and persistence traits -
//! no network I/O and no HTTP clients. Storage backends are injected through
//! [`cart::CartStorage`], so everything here runs under plain unit tests.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for product IDs, CLP amounts, order identifiers and statuses
//! - [`cart`] - The shopper's cart and its persistence port
//! - [`shipping`] - Region-based courier fee
//! - [`checkout`] - Client-side checkout state machine
//! - [`payment`] - Create/commit wire types and the result page outcome

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod payment;
pub mod shipping;
pub mod types;

pub use types::*;
