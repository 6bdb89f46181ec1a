//! HTTP client for the storefront payment API.

use febeflo_core::payment::{
    ApiErrorBody, CREATE_PATH, CreateTransactionRequest, CreateTransactionResponse,
};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Errors talking to the storefront server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response.
    #[error("could not reach the storefront: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("storefront returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// The server URL is not usable.
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Client for one storefront server.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StorefrontClient {
    /// Client for the server at `base_url`, e.g. `http://127.0.0.1:3000`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Ask the server to open a Webpay transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or rejects the request.
    #[instrument(skip_all, fields(buy_order = %request.buy_order, amount = request.amount.pesos()))]
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, ClientError> {
        let url = self.base_url.join(CREATE_PATH)?;
        let response = self.client.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            tracing::debug!(%status, %message, "Create transaction rejected");
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}
