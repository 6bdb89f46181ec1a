//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for the
//!   gateway return URL and the result page redirect)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `WEBPAY_ENV` - `integration` or `production` (default: integration)
//! - `WEBPAY_COMMERCE_CODE` - Production commerce code
//! - `WEBPAY_API_KEY` - Production API key secret
//! - `WEBPAY_API_URL` - Override the gateway host
//! - `GEMINI_API_KEY` - Enables the chat assistant
//! - `GEMINI_MODEL` - Model name (default: gemini-2.5-flash)
//! - `GEMINI_API_URL` - Override the Gemini API host
//! - `PAYMENT_EXPOSE_ERROR_DETAILS` - Forward raw commit errors to the result
//!   page (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Public Webpay Plus test commerce published by Transbank.
pub const INTEGRATION_COMMERCE_CODE: &str = "597055555532";

/// API key of the public test commerce.
pub const INTEGRATION_API_KEY: &str =
    "579B532A7440BB0C9079DED94D31EA1615BACEB56610332264630D42D0A36B1C";

/// Gateway host for the integration environment.
pub const INTEGRATION_API_URL: &str = "https://webpay3gint.transbank.cl";

/// Gateway host for the production environment.
pub const PRODUCTION_API_URL: &str = "https://webpay3g.transbank.cl";

/// Default Gemini model for the chat assistant.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API host.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Webpay Plus gateway configuration
    pub webpay: WebpayConfig,
    /// Chat assistant configuration
    pub gemini: GeminiConfig,
    /// Forward raw commit errors in the result redirect
    pub expose_payment_errors: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Which Webpay environment the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebpayEnvironment {
    #[default]
    Integration,
    Production,
}

impl std::str::FromStr for WebpayEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "integration" | "" => Ok(Self::Integration),
            "production" => Ok(Self::Production),
            other => Err(format!("expected 'integration' or 'production', got '{other}'")),
        }
    }
}

/// Webpay Plus credentials and host.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct WebpayConfig {
    /// Environment in effect after credential resolution
    pub environment: WebpayEnvironment,
    /// Commerce code (`Tbk-Api-Key-Id`)
    pub commerce_code: String,
    /// API key (`Tbk-Api-Key-Secret`)
    pub api_key: SecretString,
    /// Gateway host, without trailing slash
    pub api_url: String,
}

impl std::fmt::Debug for WebpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebpayConfig")
            .field("environment", &self.environment)
            .field("commerce_code", &self.commerce_code)
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Gemini chat assistant configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; the assistant is disabled when absent
    pub api_key: Option<SecretString>,
    /// Model name
    pub model: String,
    /// API host, without trailing slash
    pub api_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if production secrets fail validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = parse_base_url(
            "STOREFRONT_BASE_URL",
            &get_required_env("STOREFRONT_BASE_URL")?,
        )?;

        let webpay = WebpayConfig::from_env()?;
        let gemini = GeminiConfig::from_env();
        let expose_payment_errors = parse_bool(
            "PAYMENT_EXPOSE_ERROR_DETAILS",
            &get_env_or_default("PAYMENT_EXPOSE_ERROR_DETAILS", "false"),
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            webpay,
            gemini,
            expose_payment_errors,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// URL the gateway sends the shopper back to.
    #[must_use]
    pub fn commit_url(&self) -> String {
        format!("{}{}", self.base_url, febeflo_core::payment::COMMIT_PATH)
    }
}

impl WebpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = get_env_or_default("WEBPAY_ENV", "integration")
            .parse::<WebpayEnvironment>()
            .map_err(|e| ConfigError::InvalidEnvVar("WEBPAY_ENV".to_string(), e))?;

        Self::resolve(
            environment,
            get_optional_env("WEBPAY_COMMERCE_CODE"),
            get_optional_env("WEBPAY_API_KEY"),
            get_optional_env("WEBPAY_API_URL"),
        )
    }

    /// Pick credentials for the requested environment.
    ///
    /// Production is used only when both the commerce code and API key are
    /// set. Otherwise the public integration commerce is used, with a warning
    /// if production was requested.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if the production API key looks
    /// like a placeholder, or `InvalidEnvVar` if the host override is not a URL.
    pub fn resolve(
        requested: WebpayEnvironment,
        commerce_code: Option<String>,
        api_key: Option<String>,
        api_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let commerce_code = commerce_code.filter(|v| !v.trim().is_empty());
        let api_key = api_key.filter(|v| !v.trim().is_empty());

        let (environment, commerce_code, api_key) = match (requested, commerce_code, api_key) {
            (WebpayEnvironment::Production, Some(code), Some(key)) => {
                validate_secret_strength(&key, "WEBPAY_API_KEY")?;
                (WebpayEnvironment::Production, code, SecretString::from(key))
            }
            (WebpayEnvironment::Production, _, _) => {
                tracing::warn!(
                    "WEBPAY_ENV=production without WEBPAY_COMMERCE_CODE and WEBPAY_API_KEY, using integration"
                );
                integration_credentials()
            }
            (WebpayEnvironment::Integration, _, _) => integration_credentials(),
        };

        let api_url = match api_url.filter(|v| !v.trim().is_empty()) {
            Some(url) => parse_base_url("WEBPAY_API_URL", &url)?,
            None => match environment {
                WebpayEnvironment::Integration => INTEGRATION_API_URL.to_string(),
                WebpayEnvironment::Production => PRODUCTION_API_URL.to_string(),
            },
        };

        Ok(Self {
            environment,
            commerce_code,
            api_key,
            api_url,
        })
    }

    /// Configuration for the public test commerce against `api_url`.
    #[must_use]
    pub fn integration(api_url: &str) -> Self {
        let (environment, commerce_code, api_key) = integration_credentials();
        Self {
            environment,
            commerce_code,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

fn integration_credentials() -> (WebpayEnvironment, String, SecretString) {
    (
        WebpayEnvironment::Integration,
        INTEGRATION_COMMERCE_CODE.to_string(),
        SecretString::from(INTEGRATION_API_KEY),
    )
}

impl GeminiConfig {
    fn from_env() -> Self {
        Self {
            api_key: get_optional_env("GEMINI_API_KEY")
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
            model: get_env_or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            api_url: get_env_or_default("GEMINI_API_URL", DEFAULT_GEMINI_API_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check that a value is an absolute http(s) URL and strip the trailing slash.
fn parse_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_bool(var_name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are random; low entropy means a typed-in value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by Transbank."
            ),
        ));
    }

    Ok(())
}
