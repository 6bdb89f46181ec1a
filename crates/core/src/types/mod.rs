//! Core types for the Febeflo storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod order_ref;
pub mod status;

pub use id::*;
pub use money::Clp;
pub use order_ref::{BuyOrder, OrderRefError, SessionId};
pub use status::*;
