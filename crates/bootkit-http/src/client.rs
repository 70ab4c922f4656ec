//! # HTTP client
//!
//! A `reqwest::Client` configured from [`ClientProperties`] with base URL
//! resolution, the retry policy and optional exchange logging.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, ClientBuilder, Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::HttpError;
use crate::json::JsonOptions;
use crate::logger::HttpLogger;
use crate::properties::{ClientProperties, WebSocketProperties};
use crate::retry::{RetryPolicy, RETRY_COUNT_HEADER};

/// Last-mile adjustment applied to the client builder before it is built
pub struct HttpClientCustomizer(Box<dyn Fn(ClientBuilder) -> ClientBuilder + Send + Sync>);

impl HttpClientCustomizer {
    pub fn new<F>(customize: F) -> Self
    where
        F: Fn(ClientBuilder) -> ClientBuilder + Send + Sync + 'static,
    {
        Self(Box::new(customize))
    }

    pub fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        (self.0)(builder)
    }
}

impl fmt::Debug for HttpClientCustomizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientCustomizer").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Option<Url>,
    retry: RetryPolicy,
    logger: Option<Arc<HttpLogger>>,
    json: JsonOptions,
    negotiate_json: bool,
    websocket: WebSocketProperties,
}

impl HttpClient {
    /// Build a client whose transport is configured from `properties`
    pub fn from_properties(
        properties: &ClientProperties,
        customizer: Option<&HttpClientCustomizer>,
    ) -> Result<Self, HttpError> {
        let timeout = &properties.timeout;
        let request = &properties.request;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout.request))
            .connect_timeout(Duration::from_millis(timeout.connect))
            .read_timeout(Duration::from_millis(timeout.socket))
            .user_agent(request.user_agent.clone())
            .default_headers(default_headers(properties)?);

        if !request.follow_redirects {
            builder = builder.redirect(redirect::Policy::none());
        }
        if let Some(customizer) = customizer {
            builder = customizer.apply(builder);
        }

        Self::with_client(builder.build()?, properties)
    }

    /// Wrap an already built transport, keeping the policies from `properties`
    pub fn with_client(inner: reqwest::Client, properties: &ClientProperties) -> Result<Self, HttpError> {
        let base_url = match properties.request.url.trim() {
            "" => None,
            url => Some(Url::parse(url).map_err(|source| HttpError::invalid_url(url, source))?),
        };

        Ok(Self {
            inner,
            base_url,
            retry: RetryPolicy::from_config(&properties.retry),
            logger: None,
            json: JsonOptions::from_properties(&properties.content_negotiation.json),
            negotiate_json: properties.content_negotiation.enabled,
            websocket: properties.websocket.clone(),
        })
    }

    pub fn with_logger(mut self, logger: Arc<HttpLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_json(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn logger(&self) -> Option<&HttpLogger> {
        self.logger.as_deref()
    }

    pub fn json(&self) -> &JsonOptions {
        &self.json
    }

    pub fn websocket(&self) -> &WebSocketProperties {
        &self.websocket
    }

    /// Resolve `path` against the base URL; absolute URLs are used as given
    pub fn url(&self, path: &str) -> Result<Url, HttpError> {
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| HttpError::MissingBaseUrl {
                    path: path.to_string(),
                })?;
                base.join(path).map_err(|source| HttpError::invalid_url(path, source))
            }
            Err(source) => Err(HttpError::invalid_url(path, source)),
        }
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, HttpError> {
        let url = self.url(path)?;
        let builder = self.inner.request(method, url);
        Ok(if self.negotiate_json {
            builder.header(reqwest::header::ACCEPT, "application/json")
        } else {
            builder
        })
    }

    /// Send a request, retrying according to the retry policy
    ///
    /// Requests with streaming bodies cannot be cloned and are sent once.
    pub async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut attempt = 0u32;
        let mut pending = request;

        loop {
            let retry = if self.retry.is_enabled() { pending.try_clone() } else { None };

            if let Some(logger) = &self.logger {
                logger.log_request(&method, &url, pending.headers(), attempt);
            }
            let started = Instant::now();

            match self.inner.execute(pending).await {
                Ok(response) => {
                    if let Some(logger) = &self.logger {
                        logger.log_response(&method, &url, response.status(), started.elapsed());
                    }
                    match retry {
                        Some(next) if self.retry.should_retry_status(&method, response.status(), attempt) => {
                            tracing::debug!(
                                "Retrying {} {} after status {} (attempt {})",
                                method,
                                url,
                                response.status(),
                                attempt + 1
                            );
                            pending = next;
                        }
                        _ => return Ok(response),
                    }
                }
                Err(error) => {
                    if let Some(logger) = &self.logger {
                        logger.log_failure(&method, &url, &error);
                    }
                    match retry {
                        Some(next)
                            if self.retry.allows_method(&method)
                                && self.retry.should_retry_error(&error, attempt) =>
                        {
                            tracing::debug!("Retrying {} {} after error: {}", method, url, error);
                            pending = next;
                        }
                        _ => return Err(HttpError::Request(error)),
                    }
                }
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
            attempt += 1;
            pending
                .headers_mut()
                .insert(HeaderName::from_static(RETRY_COUNT_HEADER), HeaderValue::from(attempt));
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, HttpError> {
        let request = self.request(Method::GET, path)?.build()?;
        self.execute(request).await
    }

    pub async fn get_json<T: Serialize + DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.get(path).await?.error_for_status()?;
        let body = response.text().await?;
        self.json.decode(&body)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + Default,
        T: Serialize + DeserializeOwned,
    {
        let request = self
            .request(Method::POST, path)?
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(self.json.encode_record(body)?)
            .build()?;
        let response = self.execute(request).await?.error_for_status()?;
        let text = response.text().await?;
        self.json.decode(&text)
    }
}

fn default_headers(properties: &ClientProperties) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &properties.request.headers {
        let invalid = || HttpError::InvalidHeader { name: name.clone() };
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(header, value);
    }
    Ok(headers)
}
