//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::gemini::{GeminiClient, GeminiError};
use crate::webpay::{WebpayClient, WebpayError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("webpay client: {0}")]
    Webpay(#[from] WebpayError),
    #[error("gemini client: {0}")]
    Gemini(#[from] GeminiError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and holds the configuration
/// and the outbound HTTP clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    webpay: WebpayClient,
    gemini: Option<GeminiClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The chat assistant is only wired up when a Gemini API key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let webpay = WebpayClient::new(&config.webpay)?;
        let gemini = GeminiClient::from_config(&config.gemini)?;

        match &gemini {
            Some(client) => tracing::info!(model = client.model(), "Chat assistant enabled"),
            None => tracing::info!("GEMINI_API_KEY not set, chat assistant disabled"),
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                webpay,
                gemini,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Webpay client.
    #[must_use]
    pub fn webpay(&self) -> &WebpayClient {
        &self.inner.webpay
    }

    /// Get the Gemini client, if the chat assistant is enabled.
    #[must_use]
    pub fn gemini(&self) -> Option<&GeminiClient> {
        self.inner.gemini.as_ref()
    }
}
