//! Status enums shared between the storefront server and its clients.

use serde::{Deserialize, Serialize};

/// Outcome of a checkout attempt, as carried in the result page URL.
///
/// Only a gateway authorization with response code `0` is `Success`. A
/// shopper cancelling at the gateway is `Aborted`, which is a normal outcome
/// rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The gateway authorized the charge.
    Success,
    /// The gateway (or issuing bank) rejected the charge.
    Failed,
    /// The shopper cancelled at the gateway.
    Aborted,
    /// The commit could not be completed.
    Error,
}

impl PaymentStatus {
    /// Map a Webpay `response_code` to a status.
    #[must_use]
    pub const fn from_response_code(code: i64) -> Self {
        if code == 0 { Self::Success } else { Self::Failed }
    }

    /// Wire value used in the `status` query parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Error => "error",
        }
    }

    /// Whether the shopper's cart should be emptied.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "aborted" => Ok(Self::Aborted),
            "error" => Ok(Self::Error),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Speaker of a chat turn, using Gemini's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}
