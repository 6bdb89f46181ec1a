//! Gemini API client.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use crate::config::GeminiConfig;

use super::error::{ApiErrorResponse, GeminiError};
use super::persona;
use super::types::{GenerateContentRequest, GenerateContentResponse};

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    /// Create a client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_key: &SecretString, config: &GeminiConfig) -> Result<Self, GeminiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| GeminiError::InvalidApiKey(e.to_string()))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                model: config.model.clone(),
                endpoint: format!(
                    "{}/v1beta/models/{}:generateContent",
                    config.api_url.trim_end_matches('/'),
                    config.model
                ),
            }),
        })
    }

    /// Build a client from configuration, or `None` when no key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is set but unusable.
    pub fn from_config(config: &GeminiConfig) -> Result<Option<Self>, GeminiError> {
        config
            .api_key
            .as_ref()
            .map(|key| Self::new(key, config))
            .transpose()
    }

    /// Model the client talks to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Answer one shopper message in the shop assistant persona.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API returns an error, or
    /// the model produces no text.
    #[instrument(skip_all, fields(model = %self.inner.model))]
    pub async fn reply(&self, message: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: persona::conversation(message),
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))?;

        generated.text().ok_or(GeminiError::EmptyResponse)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> GeminiClient {
        let config = GeminiConfig {
            api_key: Some(SecretString::from("AIzaSyTestKey")),
            model: "gemini-2.5-flash".to_string(),
            api_url: server.uri(),
        };
        GeminiClient::from_config(&config).unwrap().unwrap()
    }

    #[test]
    fn test_from_config_without_key() {
        assert!(
            GeminiClient::from_config(&GeminiConfig::default())
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_reply_sends_persona_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "AIzaSyTestKey"))
            .and(body_json(serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": persona::INSTRUCTIONS}]},
                    {"role": "model", "parts": [{"text": persona::GREETING}]},
                    {"role": "user", "parts": [{"text": "¿Dónde están?"}]}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "En Pudahuel 📍"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).reply("¿Dónde están?").await.unwrap();
        assert_eq!(text, "En Pudahuel 📍");
    }

    #[tokio::test]
    async fn test_reply_maps_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).reply("hola").await.unwrap_err();
        assert_eq!(err.to_string(), "API error (429): Resource has been exhausted");
    }

    #[tokio::test]
    async fn test_reply_without_candidates_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).reply("hola").await.unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
    }
}
