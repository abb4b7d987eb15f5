//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `LWA_APP_ID` - Login with Amazon client identifier
//! - `LWA_CLIENT_SECRET` - Login with Amazon client secret
//! - `REDIRECT_URI` - OAuth callback URL registered with the application
//! - `SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `REFRESH_TOKEN` - Seller refresh token used for SP-API reports and fees
//! - `AUTH_URL` - Consent page (default: Seller Central consent URL)
//! - `TOKEN_URL` - LWA token endpoint (default: `https://api.amazon.com/auth/o2/token`)
//! - `PROFILE_URL` - LWA profile endpoint (default: `https://api.amazon.com/user/profile`)
//! - `OAUTH_STATE` - Static OAuth state value (default: random per request)
//! - `DASHBOARD_URL` - Where the callback redirects (default: `/dashboard`)
//! - `SPAPI_ENDPOINT` - SP-API regional endpoint (default: North America)
//! - `SPAPI_MARKETPLACE_ID` - Marketplace for reports and fees (default: Mexico)
//! - `CREDENTIAL_BACKEND` - `postgres` (default) or `memory`
//! - `HTTP_TIMEOUT_SECS` - Timeout for outbound HTTP calls (default: 30)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 10000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_TRACES_SAMPLE_RATE` - Sentry tracing sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_AUTH_URL: &str = "https://sellercentral.amazon.com/apps/authorize/consent";
const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";
const DEFAULT_PROFILE_URL: &str = "https://api.amazon.com/user/profile";
const DEFAULT_SPAPI_ENDPOINT: &str = "https://sellingpartnerapi-na.amazon.com";
const DEFAULT_MARKETPLACE_ID: &str = "A1AM78C64UM0Y8";

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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Login with Amazon OAuth configuration
    pub lwa: LwaConfig,
    /// Selling Partner API configuration
    pub spapi: SpApiConfig,
    /// Consent flow behaviour
    pub oauth: OAuthFlowConfig,
    /// Where OAuth tokens are persisted
    pub credential_backend: CredentialBackend,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Login with Amazon (LWA) OAuth configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct LwaConfig {
    /// Client identifier (`amzn1.application-oa2-client...`)
    pub app_id: String,
    /// Client secret
    pub client_secret: SecretString,
    /// Callback URL registered with the application
    pub redirect_uri: String,
    /// Seller consent page
    pub auth_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Profile endpoint
    pub profile_url: String,
}

impl std::fmt::Debug for LwaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LwaConfig")
            .field("app_id", &self.app_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("profile_url", &self.profile_url)
            .finish()
    }
}

/// Selling Partner API configuration.
///
/// Implements `Debug` manually to redact the refresh token.
#[derive(Clone)]
pub struct SpApiConfig {
    /// Regional endpoint (e.g. `https://sellingpartnerapi-na.amazon.com`)
    pub endpoint: String,
    /// Marketplace used for reports and fee estimates
    pub marketplace_id: String,
    /// Seller refresh token for application-initiated calls
    pub refresh_token: Option<SecretString>,
}

impl std::fmt::Debug for SpApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpApiConfig")
            .field("endpoint", &self.endpoint)
            .field("marketplace_id", &self.marketplace_id)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Consent flow settings.
#[derive(Debug, Clone)]
pub struct OAuthFlowConfig {
    /// How the `state` parameter is produced and checked
    pub state: OAuthStateMode,
    /// Redirect target after a successful callback
    pub dashboard_url: String,
}

/// Source of the OAuth `state` parameter.
#[derive(Clone, PartialEq, Eq)]
pub enum OAuthStateMode {
    /// Fresh random value per consent request, checked against the session.
    Random,
    /// Fixed value from `OAUTH_STATE`.
    Static(String),
}

impl std::fmt::Debug for OAuthStateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => f.write_str("Random"),
            Self::Static(_) => f.write_str("Static([REDACTED])"),
        }
    }
}

/// Backend holding persisted OAuth tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialBackend {
    /// Durable storage in the `oauth_token` table.
    #[default]
    Postgres,
    /// Process-local cache; tokens are lost on restart.
    Memory,
}

impl FromStr for CredentialBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "database" => Ok(Self::Postgres),
            "memory" | "session" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = parse_env("HOST", "0.0.0.0")?;
        let port = parse_env("PORT", "10000")?;
        let session_secret = get_validated_secret("SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SESSION_SECRET")?;

        let lwa = LwaConfig::from_env()?;
        let spapi = SpApiConfig::from_env()?;
        let oauth = OAuthFlowConfig::from_env();
        let credential_backend = parse_env("CREDENTIAL_BACKEND", "postgres")?;
        let http_timeout = Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", "30")?);

        Ok(Self {
            database_url,
            host,
            port,
            session_secret,
            lwa,
            spapi,
            oauth,
            credential_backend,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the session cookie should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.lwa.redirect_uri.starts_with("https://")
    }
}

impl LwaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_id: get_required_env("LWA_APP_ID")?,
            client_secret: get_required_secret("LWA_CLIENT_SECRET")?,
            redirect_uri: get_required_url("REDIRECT_URI")?,
            auth_url: get_url_or_default("AUTH_URL", DEFAULT_AUTH_URL)?,
            token_url: get_url_or_default("TOKEN_URL", DEFAULT_TOKEN_URL)?,
            profile_url: get_url_or_default("PROFILE_URL", DEFAULT_PROFILE_URL)?,
        })
    }
}

impl SpApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_url_or_default("SPAPI_ENDPOINT", DEFAULT_SPAPI_ENDPOINT)?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            marketplace_id: get_env_or_default("SPAPI_MARKETPLACE_ID", DEFAULT_MARKETPLACE_ID),
            refresh_token: non_blank(get_optional_env("REFRESH_TOKEN")).map(SecretString::from),
        })
    }
}

impl OAuthFlowConfig {
    fn from_env() -> Self {
        let state = non_blank(get_optional_env("OAUTH_STATE"))
            .map_or(OAuthStateMode::Random, OAuthStateMode::Static);

        Self {
            state,
            dashboard_url: get_env_or_default("DASHBOARD_URL", "/dashboard"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Treat a set-but-blank variable as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check that a value is an absolute URL.
fn validate_url(key: &str, value: String) -> Result<String, ConfigError> {
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value)
}

/// Get a required environment variable holding a URL.
fn get_required_url(key: &str) -> Result<String, ConfigError> {
    validate_url(key, get_required_env(key)?)
}

/// Get a URL environment variable with a default value.
fn get_url_or_default(key: &str, default: &str) -> Result<String, ConfigError> {
    validate_url(key, get_env_or_default(key, default))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
