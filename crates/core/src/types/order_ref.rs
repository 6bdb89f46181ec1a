//! Order correlation identifiers passed to the payment gateway.
//!
//! Webpay Plus bounds both fields: `buy_order` to 26 characters and
//! `session_id` to 61. Both must be printable ASCII with no whitespace.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the random suffix on generated identifiers.
const RANDOM_SUFFIX_BOUND: u32 = 1_000_000;

/// Errors that can occur when parsing an order identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderRefError {
    /// The input string is empty.
    #[error("{field} cannot be empty")]
    Empty {
        /// Field being parsed.
        field: &'static str,
    },
    /// The input string is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field being parsed.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or non-ASCII characters.
    #[error("{field} may only contain printable ASCII characters")]
    InvalidCharacter {
        /// Field being parsed.
        field: &'static str,
    },
}

fn validate(s: &str, field: &'static str, max: usize) -> Result<(), OrderRefError> {
    if s.is_empty() {
        return Err(OrderRefError::Empty { field });
    }
    if s.len() > max {
        return Err(OrderRefError::TooLong { field, max });
    }
    if !s.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(OrderRefError::InvalidCharacter { field });
    }
    Ok(())
}

/// Merchant-side order identifier (`buy_order` in Webpay).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuyOrder(String);

impl BuyOrder {
    /// Maximum length accepted by the gateway.
    pub const MAX_LENGTH: usize = 26;

    /// Parse a `BuyOrder` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 26 characters, or
    /// contains whitespace or non-ASCII characters.
    pub fn parse(s: &str) -> Result<Self, OrderRefError> {
        validate(s, "buyOrder", Self::MAX_LENGTH)?;
        Ok(Self(s.to_owned()))
    }

    /// Generate a fresh `O-<n>` identifier.
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self(format!("O-{}", rng.random_range(0..RANDOM_SUFFIX_BOUND)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Shopper session identifier (`session_id` in Webpay).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Maximum length accepted by the gateway.
    pub const MAX_LENGTH: usize = 61;

    /// Parse a `SessionId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 61 characters, or
    /// contains whitespace or non-ASCII characters.
    pub fn parse(s: &str) -> Result<Self, OrderRefError> {
        validate(s, "sessionId", Self::MAX_LENGTH)?;
        Ok(Self(s.to_owned()))
    }

    /// Generate a fresh `S-<n>` identifier.
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self(format!("S-{}", rng.random_range(0..RANDOM_SUFFIX_BOUND)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BuyOrder {
    type Err = OrderRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::str::FromStr for SessionId {
    type Err = OrderRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BuyOrder {
    type Error = OrderRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate(&s, "buyOrder", Self::MAX_LENGTH)?;
        Ok(Self(s))
    }
}

impl TryFrom<String> for SessionId {
    type Error = OrderRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        validate(&s, "sessionId", Self::MAX_LENGTH)?;
        Ok(Self(s))
    }
}

impl From<BuyOrder> for String {
    fn from(order: BuyOrder) -> Self {
        order.0
    }
}

impl From<SessionId> for String {
    fn from(session: SessionId) -> Self {
        session.0
    }
}
