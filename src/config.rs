//! Configuration types
//!
//! A pagestream configuration file describes how the paginator behaves and
//! which HTTP endpoint it pages through. Files are YAML (`.yaml`/`.yml`) or
//! JSON (`.json`).
//!
//! ```yaml
//! paginator:
//!   clear_on_new_request: false
//! source:
//!   url: "https://api.example.com/v1/items"
//!   records_path: "$.data"
//!   pagination:
//!     type: cursor
//!     cursor_param: starting_after
//!     cursor_path: "$.next_cursor"
//!   stop_condition:
//!     type: field
//!     path: "$.has_more"
//!     value: false
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::strategy::{PaginationStrategy, StopCondition};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration loaded from a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Paginator behaviour
    #[serde(default)]
    pub paginator: PaginatorConfig,

    /// HTTP endpoint to page through
    pub source: SourceConfig,
}

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.source.validate()
    }
}

// ============================================================================
// Paginator Config
// ============================================================================

/// Paginator behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatorConfig {
    /// Emit an empty values snapshot as soon as a new request arrives
    #[serde(default = "default_true")]
    pub clear_on_new_request: bool,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            clear_on_new_request: default_true(),
        }
    }
}

impl PaginatorConfig {
    /// Create a config with the given clear behaviour
    pub fn new(clear_on_new_request: bool) -> Self {
        Self {
            clear_on_new_request,
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Source Config
// ============================================================================

/// HTTP endpoint description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint URL for the first page
    pub url: String,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Query parameters sent with every first-page request
    #[serde(default)]
    pub params: HashMap<String, String>,

    /// Path to the records array in the response body (whole body if unset)
    #[serde(default)]
    pub records_path: Option<String>,

    /// How the next page is located
    #[serde(default)]
    pub pagination: PaginationStrategy,

    /// Extra condition that ends pagination early
    #[serde(default)]
    pub stop_condition: StopCondition,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl SourceConfig {
    /// Create a source config for a URL with defaults everywhere else
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
            records_path: None,
            pagination: PaginationStrategy::default(),
            stop_condition: StopCondition::default(),
            http: HttpConfig::default(),
        }
    }

    /// Validate URL and strategy settings
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::missing_field("source.url"));
        }
        url::Url::parse(&self.url)?;
        self.pagination.validate()?;
        self.http.validate()
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Rate limiting (disabled when unset)
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: None,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Validate timing and rate values
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(Error::invalid_value(
                "source.http.timeout_seconds",
                "must be greater than zero",
            ));
        }
        if let Some(rate_limit) = &self.rate_limit {
            if rate_limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "source.http.rate_limit.requests_per_second",
                    "must be greater than zero",
                ));
            }
        }
        Ok(())
    }

    /// Build the client configuration with default headers attached
    pub fn to_client_config(&self, headers: &HashMap<String, String>) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .max_retries(self.max_retries)
            .backoff(
                self.retry_backoff.backoff_type,
                Duration::from_millis(self.retry_backoff.initial_ms),
                Duration::from_millis(self.retry_backoff.max_ms),
            );

        builder = match &self.rate_limit {
            Some(rate_limit) => builder.rate_limit(RateLimiterConfig::new(
                rate_limit.requests_per_second,
                rate_limit.burst_size,
            )),
            None => builder.no_rate_limit(),
        };

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        for (key, value) in headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    pub requests_per_second: u32,

    /// Burst size
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_burst() -> u32 {
    1
}

// ============================================================================
// Loading
// ============================================================================

/// Load a configuration file, choosing the format by extension
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        load_config_from_json(&content)?
    } else {
        load_config_from_yaml(&content)?
    };
    config.validate()?;
    Ok(config)
}

/// Parse a YAML configuration
pub fn load_config_from_yaml(yaml: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parse a JSON configuration
pub fn load_config_from_json(json: &str) -> Result<Config> {
    Ok(serde_json::from_str(json)?)
}
