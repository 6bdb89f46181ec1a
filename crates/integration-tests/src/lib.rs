//! Integration tests for the Febeflo checkout handshake.
//!
//! Each test starts the real storefront router on an ephemeral port, with
//! Webpay replaced by a `wiremock` server, and plays the shopper's side with
//! the core cart and checkout state machine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p febeflo-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart to result page, through create and commit
//! - `payment_callbacks` - Gateway return variants (abort, rejection, errors)

use std::net::SocketAddr;

use febeflo_storefront::config::{GeminiConfig, StorefrontConfig, WebpayConfig};
use febeflo_storefront::state::AppState;
use reqwest::Client;
use serde::Serialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Webpay transactions resource path.
pub const TX_PATH: &str = "/rswebpaytransaction/api/webpay/v1.2/transactions";

/// A running storefront wired to a mock Webpay.
pub struct TestContext {
    /// Client that does not follow redirects, so tests can read `Location`.
    pub client: Client,
    pub storefront_url: String,
    pub webpay: MockServer,
}

impl TestContext {
    /// Start a storefront with default settings.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start a storefront after adjusting its configuration.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_config(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let webpay = MockServer::start().await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let storefront_url = format!("http://{addr}");

        let mut config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: storefront_url.clone(),
            webpay: WebpayConfig::integration(&webpay.uri()),
            gemini: GeminiConfig::default(),
            expose_payment_errors: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build app state");
        let app = febeflo_storefront::app(state);
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            storefront_url,
            webpay,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    /// Make the mock gateway open a transaction with `token`.
    pub async fn mock_create(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path(TX_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": token,
                "url": "https://webpay3gint.transbank.cl/webpayserver/initTransaction"
            })))
            .expect(1)
            .mount(&self.webpay)
            .await;
    }

    /// Make the mock gateway answer the commit of `token` with `body`.
    pub async fn mock_commit(&self, token: &str, body: impl Serialize) {
        Mock::given(method("PUT"))
            .and(path(format!("{TX_PATH}/{token}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.webpay)
            .await;
    }
}

/// A Webpay commit response body.
#[must_use]
pub fn commit_body(response_code: i64, amount: u64, buy_order: &str) -> serde_json::Value {
    serde_json::json!({
        "vci": "TSY",
        "amount": amount,
        "status": if response_code == 0 { "AUTHORIZED" } else { "FAILED" },
        "buy_order": buy_order,
        "session_id": "S-1",
        "card_detail": {"card_number": "6623"},
        "accounting_date": "1129",
        "transaction_date": "2025-11-29T15:04:05.123Z",
        "authorization_code": if response_code == 0 { "1213" } else { "000000" },
        "payment_type_code": "VN",
        "response_code": response_code,
        "installments_number": 0
    })
}
