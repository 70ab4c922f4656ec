use reqwest::{Method, StatusCode};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::properties::RetryConfig;

/// Header carrying the retry number on repeated requests
pub const RETRY_COUNT_HEADER: &str = "x-retry-count";

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Decides whether a failed exchange is attempted again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay_millis: u64,
    on_all_requests: bool,
    on_connect_timeout: bool,
    on_response_codes: BTreeSet<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.attempts,
            delay_millis: config.delay_millis,
            on_all_requests: config.on_all_requests,
            on_connect_timeout: config.on_connect_timeout,
            on_response_codes: config.on_response_codes.clone(),
        }
    }

    /// A policy that never retries
    pub fn disabled() -> Self {
        Self::from_config(&RetryConfig::default())
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// GET, HEAD and OPTIONS always qualify; other methods only when enabled for all requests
    pub fn allows_method(&self, method: &Method) -> bool {
        matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) || self.on_all_requests
    }

    /// Whether a response with `status` after `attempt` retries is retried
    pub fn should_retry_status(&self, method: &Method, status: StatusCode, attempt: u32) -> bool {
        attempt < self.max_retries
            && self.on_response_codes.contains(&status.as_u16())
            && self.allows_method(method)
    }

    /// Whether a transport error after `attempt` retries is retried
    ///
    /// Timeouts qualify only with `on_connect_timeout`; other connection
    /// failures always qualify.
    pub fn should_retry_error(&self, error: &reqwest::Error, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        if error.is_timeout() {
            return self.on_connect_timeout;
        }
        error.is_connect() || error.is_request()
    }

    /// Exponential backoff: `delay_millis * 2^attempt`, capped at one minute
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.delay_millis.saturating_mul(factor)).min(MAX_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32, on_all_requests: bool) -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig {
            attempts,
            on_all_requests,
            ..Default::default()
        })
    }

    #[test]
    fn test_idempotent_methods_only_by_default() {
        let policy = policy(2, false);
        let unavailable = StatusCode::SERVICE_UNAVAILABLE;

        assert!(policy.should_retry_status(&Method::GET, unavailable, 0));
        assert!(policy.should_retry_status(&Method::HEAD, unavailable, 1));
        assert!(!policy.should_retry_status(&Method::POST, unavailable, 0));
        assert!(!policy.should_retry_status(&Method::GET, unavailable, 2));
        assert!(!policy.should_retry_status(&Method::GET, StatusCode::NOT_FOUND, 0));
    }

    #[test]
    fn test_all_requests() {
        let policy = policy(1, true);
        assert!(policy.should_retry_status(&Method::POST, StatusCode::BAD_GATEWAY, 0));
    }

    #[test]
    fn test_custom_status_codes() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            attempts: 2,
            on_response_codes: [429, 504].into_iter().collect(),
            ..Default::default()
        });
        assert!(policy.should_retry_status(&Method::GET, StatusCode::TOO_MANY_REQUESTS, 0));
        assert!(!policy.should_retry_status(&Method::GET, StatusCode::SERVICE_UNAVAILABLE, 0));
    }

    #[test]
    fn test_disabled_by_default() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_enabled());
        assert!(!policy.should_retry_status(&Method::GET, StatusCode::SERVICE_UNAVAILABLE, 0));
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = policy(10, false);
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
        assert_eq!(policy.delay(40), MAX_DELAY);
    }
}
