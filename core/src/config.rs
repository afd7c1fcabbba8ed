//! Gateway configuration.
//!
//! The base endpoint is resolved once at process startup and stored in a
//! write-once cell. Request handling never reads the environment.

use std::sync::OnceLock;
use std::time::Duration;

use crate::error::ApiError;

pub const BASE_URL_ENV: &str = "CONTENT_API_URL";
pub const FANOUT_LIMIT_ENV: &str = "CONTENT_FANOUT_LIMIT";
pub const RATING_TIMEOUT_ENV: &str = "CONTENT_RATING_TIMEOUT_MS";

static GLOBAL: OnceLock<GatewayConfig> = OnceLock::new();

/// Configuration for a `ContentGateway`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    base_url: String,
    fanout_limit: Option<usize>,
    rating_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Create a config for `base_url` with an unbounded rating fan-out and no
    /// per-request timeout. Trailing slashes are stripped.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ApiError::Config("base url cannot be empty".into()));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            fanout_limit: None,
            rating_timeout: None,
        })
    }

    /// Cap the number of rating requests in flight at once.
    pub fn with_fanout_limit(mut self, limit: usize) -> Result<Self, ApiError> {
        if limit == 0 {
            return Err(ApiError::Config("fanout limit must be positive".into()));
        }
        self.fanout_limit = Some(limit);
        Ok(self)
    }

    /// Give up on an individual rating request after `timeout`.
    pub fn with_rating_timeout(mut self, timeout: Duration) -> Self {
        self.rating_timeout = Some(timeout);
        self
    }

    /// Load `.env` if present, then read the gateway variables.
    pub fn from_env() -> Result<Self, ApiError> {
        let _ = dotenvy::dotenv();
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| ApiError::Config(format!("{BASE_URL_ENV} is not set")))?;
        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = std::env::var(FANOUT_LIMIT_ENV) {
            let limit = raw
                .parse::<usize>()
                .map_err(|e| ApiError::Config(format!("{FANOUT_LIMIT_ENV}: {e}")))?;
            config = config.with_fanout_limit(limit)?;
        }
        if let Ok(raw) = std::env::var(RATING_TIMEOUT_ENV) {
            let millis = raw
                .parse::<u64>()
                .map_err(|e| ApiError::Config(format!("{RATING_TIMEOUT_ENV}: {e}")))?;
            config = config.with_rating_timeout(Duration::from_millis(millis));
        }
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fanout_limit(&self) -> Option<usize> {
        self.fanout_limit
    }

    pub fn rating_timeout(&self) -> Option<Duration> {
        self.rating_timeout
    }
}

/// Install the process-wide configuration. Fails if one is already set.
pub fn init(config: GatewayConfig) -> Result<&'static GatewayConfig, ApiError> {
    GLOBAL
        .set(config)
        .map_err(|_| ApiError::Config("gateway config already initialized".into()))?;
    get()
}

/// The process-wide configuration installed by `init`.
pub fn get() -> Result<&'static GatewayConfig, ApiError> {
    GLOBAL
        .get()
        .ok_or_else(|| ApiError::Config("gateway config not initialized".into()))
}
