//! HTTP transport for page sources
//!
//! - **Retries**: transient failures (timeouts, 429, 5xx) are retried with backoff
//! - **Rate limiting**: token bucket limiter using governor
//! - **Backoff**: constant, linear, and exponential

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, JsonResponse, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
