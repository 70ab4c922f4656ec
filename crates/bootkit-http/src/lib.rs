//! # bootkit-http
//!
//! Auto-configures a `reqwest` based [`HttpClient`] from `http.client.*`
//! properties: timeouts, base URL, default headers, retry with exponential
//! backoff, JSON options and exchange logging.

pub mod auto_config;
pub mod client;
pub mod error;
pub mod json;
pub mod logger;
pub mod properties;
pub mod retry;

pub use auto_config::{http_initializer, HttpAutoConfiguration};
pub use client::{HttpClient, HttpClientCustomizer};
pub use error::HttpError;
pub use json::JsonOptions;
pub use logger::HttpLogger;
pub use properties::{
    ClientProperties, HttpLogLevel, HttpProperties, HttpPropertiesExt, RetryConfig, TimeoutProperties,
};
pub use retry::{RetryPolicy, RETRY_COUNT_HEADER};
