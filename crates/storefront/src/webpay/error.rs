//! Error types for the Webpay client.

use thiserror::Error;

/// Errors that can occur when talking to Webpay.
#[derive(Debug, Error)]
pub enum WebpayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Webpay returned a non-success status.
    #[error("Webpay API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Credentials could not be encoded as headers.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The transaction URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Error body Webpay sends with 4xx/5xx responses.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webpay_error_display() {
        let err = WebpayError::Api {
            status: 422,
            message: "Invalid value for parameter: amount".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Webpay API error: 422 - Invalid value for parameter: amount"
        );
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{"error_message": "Transaction already locked by another process"}"#;
        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            response.error_message,
            "Transaction already locked by another process"
        );
    }
}
