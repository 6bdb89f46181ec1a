//! Shipping fees.
//!
//! Courier delivery (Starken) costs a flat fee that depends only on whether
//! the destination is in the Santiago metropolitan region. Store pickup at
//! the Pudahuel stall is free.

use serde::{Deserialize, Serialize};

use crate::types::Clp;

/// Courier fee inside the Metropolitana region.
pub const METROPOLITAN_FEE: Clp = Clp::new(2990);

/// Courier fee for every other region.
pub const OTHER_REGIONS_FEE: Clp = Clp::new(3990);

/// Region name that qualifies for [`METROPOLITAN_FEE`].
pub const METROPOLITAN_REGION: &str = "Metropolitana";

/// Courier fee for a destination region.
///
/// Matching is case-insensitive and accepts "Metropolitana",
/// "Región Metropolitana", "Region Metropolitana" and "RM".
#[must_use]
pub fn shipping_fee(region: &str) -> Clp {
    if is_metropolitan(region) {
        METROPOLITAN_FEE
    } else {
        OTHER_REGIONS_FEE
    }
}

fn is_metropolitan(region: &str) -> bool {
    let normalized = region.trim().to_lowercase();
    let name = normalized
        .strip_prefix("región ")
        .or_else(|| normalized.strip_prefix("region "))
        .unwrap_or(&normalized)
        .trim();

    name == "rm" || name.eq_ignore_ascii_case(METROPOLITAN_REGION)
}

/// How the order reaches the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Delivery {
    /// Pickup at the shop.
    StorePickup,
    /// Starken courier to a region.
    Courier {
        /// Destination region name.
        region: String,
    },
}

impl Delivery {
    /// Fee added to the cart subtotal.
    #[must_use]
    pub fn fee(&self) -> Clp {
        match self {
            Self::StorePickup => Clp::ZERO,
            Self::Courier { region } => shipping_fee(region),
        }
    }
}
