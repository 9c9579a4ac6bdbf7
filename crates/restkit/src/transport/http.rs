//! Blocking HTTP transport.
//!
//! This module provides [`HttpTransport`], which sends JSON requests to a
//! configured endpoint with `ureq` and decodes JSON responses.
//!
//! # Retries
//!
//! Only network-level failures of idempotent verbs are retried. A `POST`
//! that timed out may still have created something remotely, so it is
//! attempted exactly once.

use super::{Method, Request, Transport};
use crate::error::{Error, Result};
use crate::retry::{RetryConfig, with_retry};
use serde_json::Value;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("restkit/", env!("CARGO_PKG_VERSION"));

/// HTTP transport bound to one API endpoint.
///
/// # Example
///
/// ```no_run
/// use restkit::transport::http::HttpTransport;
/// use restkit::transport::Transport;
///
/// let transport = HttpTransport::new("https://api.example.com");
/// let events = transport.get("/events", Some("token")).unwrap();
/// println!("{events}");
/// ```
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Endpoint every path is appended to.
    base_url: String,
    retry: RetryConfig,
    user_agent: String,
}

impl HttpTransport {
    /// Create a transport with the default timeout and retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, DEFAULT_TIMEOUT, RetryConfig::default())
    }

    /// Create a transport with an explicit timeout and retry policy.
    #[must_use]
    pub fn with_options(base_url: impl Into<String>, timeout: Duration, retry: RetryConfig) -> Self {
        // Statuses are inspected here so error bodies can be surfaced.
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into(),
            retry,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the configured endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn with_headers<B>(
        &self,
        builder: ureq::RequestBuilder<B>,
        token: Option<&str>,
    ) -> ureq::RequestBuilder<B> {
        let builder = builder
            .header("Content-Type", "application/json")
            .header("User-Agent", self.user_agent.as_str());

        match token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    fn send_once(&self, request: &Request<'_>) -> Result<Value> {
        let url = self.url(request.path);
        log::debug!("{} {}", request.method, url);

        let mut response = match request.method {
            Method::Get => self.with_headers(self.agent.get(&url), request.token).call()?,
            Method::Delete => self
                .with_headers(self.agent.delete(&url), request.token)
                .call()?,
            Method::Post | Method::Put => {
                let builder = if request.method == Method::Post {
                    self.agent.post(&url)
                } else {
                    self.agent.put(&url)
                };
                let builder = self.with_headers(builder, request.token);
                match request.payload {
                    Some(payload) => builder.send_json(payload)?,
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        if !(200..300).contains(&status) {
            log::debug!("Response status: {}, body: {}", status, text);
            return Err(Error::http(status, text));
        }

        log::debug!("Response status: {}", status);
        decode_body(&text)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request<'_>) -> Result<Value> {
        if request.method.is_idempotent() {
            with_retry(&self.retry, || self.send_once(&request))
        } else {
            self.send_once(&request)
        }
    }
}

/// Decode a 2xx body: empty means `Null`, otherwise a JSON object or array.
pub fn decode_body(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}
