//! Transbank Webpay Plus REST client.
//!
//! Only the two calls the payment handshake needs are implemented:
//!
//! ```text
//! POST {host}/rswebpaytransaction/api/webpay/v1.2/transactions          - create
//! PUT  {host}/rswebpaytransaction/api/webpay/v1.2/transactions/{token}  - commit
//! ```
//!
//! Both authenticate with the `Tbk-Api-Key-Id` / `Tbk-Api-Key-Secret` header
//! pair. Refunds, status queries and captures are out of scope.

mod client;
mod error;
pub mod types;

pub use client::WebpayClient;
pub use error::WebpayError;
pub use types::{CommitResponse, CreateResponse};
