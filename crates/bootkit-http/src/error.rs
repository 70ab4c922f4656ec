use thiserror::Error;

/// Errors raised by the configured HTTP client
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Relative path '{path}' needs http.client.request.url to be set")]
    MissingBaseUrl { path: String },

    #[error("Invalid default header '{name}'")]
    InvalidHeader { name: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}
