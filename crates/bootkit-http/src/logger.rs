use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use url::Url;

use crate::properties::HttpLogLevel;

/// Writes HTTP exchanges to `tracing` under the `bootkit::http` target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HttpLogger {
    level: HttpLogLevel,
}

impl HttpLogger {
    pub fn new(level: HttpLogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> HttpLogLevel {
        self.level
    }

    fn logs_headers(&self) -> bool {
        matches!(self.level, HttpLogLevel::All | HttpLogLevel::Headers)
    }

    pub fn log_request(&self, method: &Method, url: &Url, headers: &HeaderMap, attempt: u32) {
        if self.level == HttpLogLevel::None {
            return;
        }
        tracing::info!(target: "bootkit::http", method = %method, url = %url, attempt, "REQUEST");
        if self.logs_headers() {
            for (name, value) in headers {
                tracing::info!(
                    target: "bootkit::http",
                    header = %name,
                    value = value.to_str().unwrap_or("<binary>"),
                    "request header"
                );
            }
        }
    }

    pub fn log_response(&self, method: &Method, url: &Url, status: StatusCode, elapsed: Duration) {
        if self.level == HttpLogLevel::None {
            return;
        }
        tracing::info!(
            target: "bootkit::http",
            method = %method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "RESPONSE"
        );
    }

    pub fn log_failure(&self, method: &Method, url: &Url, error: &reqwest::Error) {
        if self.level == HttpLogLevel::None {
            return;
        }
        tracing::warn!(target: "bootkit::http", method = %method, url = %url, error = %error, "REQUEST FAILED");
    }
}
