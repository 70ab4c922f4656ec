//! HTTP client properties bound from `http.client.*`

use bootkit::properties::{PropertyRecord, PropertyStore};
use bootkit::PropertyError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const HTTP_CLIENT_TIMEOUT_REQUEST: &str = "http.client.timeout.request";
pub const HTTP_CLIENT_TIMEOUT_CONNECT: &str = "http.client.timeout.connect";
pub const HTTP_CLIENT_TIMEOUT_SOCKET: &str = "http.client.timeout.socket";
pub const HTTP_CLIENT_LOGGING_ENABLED: &str = "http.client.logging.enabled";
pub const HTTP_CLIENT_LOGGING_LEVEL: &str = "http.client.logging.level";
pub const HTTP_CLIENT_REQUEST_FOLLOW_REDIRECTS: &str = "http.client.request.followRedirects";
pub const HTTP_CLIENT_REQUEST_URL: &str = "http.client.request.url";
pub const HTTP_CLIENT_REQUEST_USER_AGENT: &str = "http.client.request.userAgent";
pub const HTTP_CLIENT_REQUEST_HEADERS: &str = "http.client.request.headers";
pub const HTTP_CLIENT_RETRY_ATTEMPTS: &str = "http.client.retry.attempts";
pub const HTTP_CLIENT_RETRY_DELAY_MILLIS: &str = "http.client.retry.delayMillis";
pub const HTTP_CLIENT_RETRY_ON_ALL_REQUESTS: &str = "http.client.retry.onAllRequests";
pub const HTTP_CLIENT_RETRY_ON_CONNECT_TIMEOUT: &str = "http.client.retry.onConnectTimeout";
pub const HTTP_CLIENT_RETRY_ON_RESPONSE_CODES: &str = "http.client.retry.onResponseCodes";
pub const HTTP_CLIENT_CONTENT_NEGOTIATION_ENABLED: &str = "http.client.content.negotiation.enabled";
pub const HTTP_CLIENT_JSON_IGNORE_UNKNOWN_KEYS: &str =
    "http.client.content.negotiation.json.ignoreUnknownKeys";
pub const HTTP_CLIENT_JSON_IS_LENIENT: &str = "http.client.content.negotiation.json.isLenient";
pub const HTTP_CLIENT_JSON_ENCODE_DEFAULTS: &str = "http.client.content.negotiation.json.encodeDefaults";
pub const HTTP_CLIENT_JSON_PRETTY_PRINT: &str = "http.client.content.negotiation.json.prettyPrint";
pub const HTTP_CLIENT_WEBSOCKET_ENABLED: &str = "http.client.websocket.enabled";
pub const HTTP_CLIENT_WEBSOCKET_PING_INTERVAL: &str = "http.client.websocket.pingInterval";
pub const HTTP_CLIENT_WEBSOCKET_MAX_FRAME_SIZE: &str = "http.client.websocket.maxFrameSize";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http")]
pub struct HttpProperties {
    #[property(nested)]
    pub client: ClientProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client")]
pub struct ClientProperties {
    #[property(nested)]
    pub timeout: TimeoutProperties,
    #[property(nested)]
    pub logging: LoggingProperties,
    #[property(nested)]
    pub request: RequestProperties,
    #[property(nested)]
    pub retry: RetryConfig,
    #[property(nested)]
    pub content_negotiation: ContentNegotiationProperties,
    #[property(nested)]
    pub websocket: WebSocketProperties,
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.timeout")]
pub struct TimeoutProperties {
    pub request: u64,
    pub connect: u64,
    pub socket: u64,
}

impl Default for TimeoutProperties {
    fn default() -> Self {
        Self {
            request: 30_000,
            connect: 30_000,
            socket: 30_000,
        }
    }
}

/// How much of each exchange the request logger writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpLogLevel {
    All,
    Headers,
    Body,
    #[default]
    Info,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.logging")]
pub struct LoggingProperties {
    pub enabled: bool,
    pub level: HttpLogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.request")]
pub struct RequestProperties {
    pub follow_redirects: bool,
    /// Base URL relative request paths are resolved against
    pub url: String,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestProperties {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            url: String::new(),
            user_agent: "bootkit http client".to_string(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.retry")]
pub struct RetryConfig {
    /// Retries after the first attempt, 0 disables retrying
    pub attempts: u32,
    pub delay_millis: u64,
    /// Retry non-idempotent methods too
    pub on_all_requests: bool,
    pub on_connect_timeout: bool,
    pub on_response_codes: BTreeSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_millis: 100,
            on_all_requests: false,
            on_connect_timeout: false,
            on_response_codes: (500..=599).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.content.negotiation")]
pub struct ContentNegotiationProperties {
    pub enabled: bool,
    #[property(nested)]
    pub json: JsonProperties,
}

impl Default for ContentNegotiationProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            json: JsonProperties::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.content.negotiation.json")]
pub struct JsonProperties {
    pub ignore_unknown_keys: bool,
    pub is_lenient: bool,
    pub encode_defaults: bool,
    pub pretty_print: bool,
}

impl Default for JsonProperties {
    fn default() -> Self {
        Self {
            ignore_unknown_keys: true,
            is_lenient: true,
            encode_defaults: false,
            pretty_print: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, PropertyRecord)]
#[serde(default, rename_all = "camelCase")]
#[property(prefix = "http.client.websocket")]
pub struct WebSocketProperties {
    pub enabled: bool,
    /// Milliseconds between pings
    pub ping_interval: u64,
    /// Bytes
    pub max_frame_size: u64,
}

impl Default for WebSocketProperties {
    fn default() -> Self {
        Self {
            enabled: false,
            ping_interval: 15_000,
            max_frame_size: 65_536,
        }
    }
}

/// Typed setters for the `http.client.*` keys
pub trait HttpPropertiesExt {
    fn http_client_request_url(&mut self, url: &str) -> Result<&mut Self, PropertyError>;
    fn http_client_request_user_agent(&mut self, user_agent: &str) -> Result<&mut Self, PropertyError>;
    fn http_client_request_header(&mut self, name: &str, value: &str) -> Result<&mut Self, PropertyError>;
    fn http_client_logging_enabled(&mut self, enabled: bool) -> Result<&mut Self, PropertyError>;
    fn http_client_logging_level(&mut self, level: HttpLogLevel) -> Result<&mut Self, PropertyError>;
    fn http_client_retry_attempts(&mut self, attempts: u32) -> Result<&mut Self, PropertyError>;
    fn http_client_retry_delay_millis(&mut self, delay: u64) -> Result<&mut Self, PropertyError>;
    fn http_client_retry_on_all_requests(&mut self, enabled: bool) -> Result<&mut Self, PropertyError>;
    fn http_client_retry_on_connect_timeout(&mut self, enabled: bool) -> Result<&mut Self, PropertyError>;
    fn http_client_retry_on_response_codes(&mut self, codes: &[u16]) -> Result<&mut Self, PropertyError>;
    fn http_client_timeout_request(&mut self, millis: u64) -> Result<&mut Self, PropertyError>;
}

impl HttpPropertiesExt for PropertyStore {
    fn http_client_request_url(&mut self, url: &str) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_REQUEST_URL, url)?;
        Ok(self)
    }

    fn http_client_request_user_agent(&mut self, user_agent: &str) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_REQUEST_USER_AGENT, user_agent)?;
        Ok(self)
    }

    fn http_client_request_header(&mut self, name: &str, value: &str) -> Result<&mut Self, PropertyError> {
        self.set(&format!("{}.{}", HTTP_CLIENT_REQUEST_HEADERS, name), value)?;
        Ok(self)
    }

    fn http_client_logging_enabled(&mut self, enabled: bool) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_LOGGING_ENABLED, enabled)?;
        Ok(self)
    }

    fn http_client_logging_level(&mut self, level: HttpLogLevel) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_LOGGING_LEVEL, level)?;
        Ok(self)
    }

    fn http_client_retry_attempts(&mut self, attempts: u32) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_RETRY_ATTEMPTS, attempts)?;
        Ok(self)
    }

    fn http_client_retry_delay_millis(&mut self, delay: u64) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_RETRY_DELAY_MILLIS, delay)?;
        Ok(self)
    }

    fn http_client_retry_on_all_requests(&mut self, enabled: bool) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_RETRY_ON_ALL_REQUESTS, enabled)?;
        Ok(self)
    }

    fn http_client_retry_on_connect_timeout(&mut self, enabled: bool) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_RETRY_ON_CONNECT_TIMEOUT, enabled)?;
        Ok(self)
    }

    fn http_client_retry_on_response_codes(&mut self, codes: &[u16]) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_RETRY_ON_RESPONSE_CODES, codes)?;
        Ok(self)
    }

    fn http_client_timeout_request(&mut self, millis: u64) -> Result<&mut Self, PropertyError> {
        self.set(HTTP_CLIENT_TIMEOUT_REQUEST, millis)?;
        Ok(self)
    }
}
