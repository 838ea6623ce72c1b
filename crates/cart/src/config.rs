//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ROCKETSHOES_API_URL` - Base URL of the stock/catalog API (default: <http://localhost:3333>)
//! - `ROCKETSHOES_API_TOKEN` - Bearer token sent to the API
//! - `ROCKETSHOES_STORAGE_PATH` - File backing the local store (default: `.rocketshoes/storage.json`)
//! - `ROCKETSHOES_STORAGE_KEY` - Key the cart is stored under (default: `@RocketShoes:cart`)
//! - `ROCKETSHOES_CATALOG_CACHE_TTL_SECS` - Product cache TTL, 0 disables (default: 300)
//! - `ROCKETSHOES_CURRENCY` - Currency used to format totals (default: BRL)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use rocketshoes_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Key the cart is persisted under unless overridden.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_API_URL: &str = "http://localhost:3333";
const DEFAULT_STORAGE_PATH: &str = ".rocketshoes/storage.json";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Stock and catalog API configuration
    pub api: ApiConfig,
    /// File backing the persistent key-value store
    pub storage_path: PathBuf,
    /// Key the cart is stored under
    pub storage_key: String,
    /// Currency used when formatting totals
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Stock and catalog API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; `stock/{id}` and `products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// How long product details stay cached, `None` disables caching
    pub catalog_cache_ttl: Option<Duration>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// API configuration for `base_url` with the default cache TTL and no token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid
    /// absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ROCKETSHOES_API_URL", base_url)?,
            token: None,
            catalog_cache_ttl: Some(Duration::from_secs(300)),
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(
            "ROCKETSHOES_API_URL",
            &env_or("ROCKETSHOES_API_URL", DEFAULT_API_URL),
        )?;
        let token = lookup("ROCKETSHOES_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
        let ttl_secs = env_or(
            "ROCKETSHOES_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar(
                "ROCKETSHOES_CATALOG_CACHE_TTL_SECS".to_string(),
                e.to_string(),
            )
        })?;
        let catalog_cache_ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));

        let storage_path = PathBuf::from(env_or("ROCKETSHOES_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let storage_key = env_or("ROCKETSHOES_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "ROCKETSHOES_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let currency = env_or("ROCKETSHOES_CURRENCY", CurrencyCode::default().code())
            .parse::<CurrencyCode>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ROCKETSHOES_CURRENCY".to_string(), e.to_string())
            })?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                token,
                catalog_cache_ttl,
            },
            storage_path,
            storage_key,
            currency,
            sentry_dsn: lookup("SENTRY_DSN"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, making sure relative joins keep its path.
///
/// `Url::join` replaces the last path segment unless the base ends in `/`,
/// so `http://host/api` is normalized to `http://host/api/`.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
