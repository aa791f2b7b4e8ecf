//! Client configuration (environment driven).

use std::time::Duration;

use thiserror::Error;

pub const API_URL_VAR: &str = "STOREFRONT_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "STOREFRONT_REQUEST_TIMEOUT_SECS";
pub const SEARCH_DEBOUNCE_VAR: &str = "STOREFRONT_SEARCH_DEBOUNCE_MS";
pub const PLACEHOLDER_ICON_VAR: &str = "STOREFRONT_PLACEHOLDER_ICON";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the lesson service, without a trailing slash.
    pub api_url: String,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    /// Image shown when a lesson icon fails to load.
    pub placeholder_icon: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(10),
            search_debounce: Duration::from_millis(300),
            placeholder_icon: "images/placeholder.png".to_string(),
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            config = config.with_api_url(url)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout = Duration::from_secs(parse_number(REQUEST_TIMEOUT_VAR, &raw)?);
        }
        if let Some(raw) = lookup(SEARCH_DEBOUNCE_VAR) {
            config.search_debounce = Duration::from_millis(parse_number(SEARCH_DEBOUNCE_VAR, &raw)?);
        }
        if let Some(path) = lookup(PLACEHOLDER_ICON_VAR) {
            if path.trim().is_empty() {
                return Err(ConfigError::Empty(PLACEHOLDER_ICON_VAR));
            }
            config.placeholder_icon = path;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Empty(API_URL_VAR));
        }
        self.api_url = trimmed.to_string();
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }
}

fn parse_number(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
