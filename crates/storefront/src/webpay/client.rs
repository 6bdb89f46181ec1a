//! Webpay Plus HTTP client.

use std::sync::Arc;

use febeflo_core::{BuyOrder, Clp, SessionId};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use crate::config::WebpayConfig;

use super::error::{ApiErrorResponse, WebpayError};
use super::types::{CommitResponse, CreateRequest, CreateResponse};

/// Transaction resource path, relative to the gateway host.
const TRANSACTIONS_PATH: &str = "/rswebpaytransaction/api/webpay/v1.2/transactions";

/// Webpay Plus transaction client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct WebpayClient {
    inner: Arc<WebpayClientInner>,
}

struct WebpayClientInner {
    client: reqwest::Client,
    transactions_url: String,
}

impl WebpayClient {
    /// Create a client for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are not valid header values or the
    /// HTTP client fails to build.
    pub fn new(config: &WebpayConfig) -> Result<Self, WebpayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Tbk-Api-Key-Id",
            HeaderValue::from_str(&config.commerce_code)
                .map_err(|e| WebpayError::InvalidCredentials(format!("commerce code: {e}")))?,
        );

        let mut secret = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| WebpayError::InvalidCredentials(format!("API key: {e}")))?;
        secret.set_sensitive(true);
        headers.insert("Tbk-Api-Key-Secret", secret);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(WebpayClientInner {
                client,
                transactions_url: format!(
                    "{}{TRANSACTIONS_PATH}",
                    config.api_url.trim_end_matches('/')
                ),
            }),
        })
    }

    /// Open a transaction and get the token and form URL for the shopper.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the gateway rejects it, or the
    /// response cannot be parsed.
    #[instrument(skip_all, fields(buy_order = %buy_order, amount = amount.pesos()))]
    pub async fn create(
        &self,
        buy_order: &BuyOrder,
        session_id: &SessionId,
        amount: Clp,
        return_url: &str,
    ) -> Result<CreateResponse, WebpayError> {
        let request = CreateRequest {
            buy_order,
            session_id,
            amount,
            return_url,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.transactions_url)
            .json(&request)
            .send()
            .await?;

        let created: CreateResponse = handle_response(response).await?;
        tracing::info!("Webpay transaction created");
        Ok(created)
    }

    /// Confirm a transaction after the shopper returns from the gateway.
    ///
    /// A rejected card is not an error: it comes back as a response with a
    /// non-zero `response_code`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the gateway rejects the token,
    /// or the response cannot be parsed.
    #[instrument(skip(self, token))]
    pub async fn commit(&self, token: &str) -> Result<CommitResponse, WebpayError> {
        let url = self.transaction_url(token)?;
        let response = self.inner.client.put(url).send().await?;

        let committed: CommitResponse = handle_response(response).await?;
        tracing::info!(
            buy_order = %committed.buy_order,
            response_code = committed.response_code,
            "Webpay transaction committed"
        );
        Ok(committed)
    }

    /// `{transactions_url}/{token}` with the token percent-encoded as a
    /// single path segment.
    fn transaction_url(&self, token: &str) -> Result<Url, WebpayError> {
        let mut url = Url::parse(&self.inner.transactions_url)?;
        url.path_segments_mut()
            .map_err(|()| {
                WebpayError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?
            .push(token);
        Ok(url)
    }
}

/// Parse a success body, or turn an error status into `WebpayError::Api`.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WebpayError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map_or(body, |e| e.error_message);
        return Err(WebpayError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| WebpayError::Parse(format!("Failed to parse response: {e}")))
}
