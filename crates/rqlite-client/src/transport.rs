//! HTTP transport.
//!
//! The executor talks to nodes through the [`Transport`] trait so the
//! failover logic does not depend on a particular HTTP stack.
//! [`HttpTransport`] is the blocking `reqwest` implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use url::Url;

use crate::encode::Method;
use crate::error::{Result, TransportError};

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const JSON_CONTENT_TYPE: &str = "application/json";

/// Default per-request timeout of the HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// An HTTP response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers, names lower-cased.
    pub headers: Vec<(String, String)>,
    /// Body text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response without headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the first header with the given name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends one HTTP request to one URL.
///
/// Implementations report any response, including non-2xx ones, as `Ok`.
/// `Err` means no response was received.
pub trait Transport: Send + Sync {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was received.
    fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        (**self).send(method, url, body)
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Sets the overall request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<HttpTransport> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = Client::builder()
            .user_agent(APP_USER_AGENT)
            .default_headers(default_headers)
            // A 3xx from a follower is that node's answer; the registry
            // decides where to go next.
            .redirect(Policy::none())
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        Ok(HttpTransport {
            inner: builder.build()?,
        })
    }
}

/// Blocking `reqwest` transport.
///
/// Redirects are not followed: a 3xx response is returned as is, so the
/// executor records it as a failure of that node.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Creates a transport with default timeouts.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut request = match method {
            Method::Get => self.inner.get(url.clone()),
            Method::Post => self.inner.post(url.clone()),
        };
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(body.to_string());
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(503, "").is_success());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(200, "{}").with_header("X-Rqlite-Version", "v8.0.0");
        assert_eq!(response.header("x-rqlite-version"), Some("v8.0.0"));
        assert_eq!(response.header("X-RQLITE-VERSION"), Some("v8.0.0"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_build_default_transport() {
        assert!(HttpTransport::builder()
            .timeout(Duration::from_secs(1))
            .connect_timeout(Duration::from_millis(500))
            .build()
            .is_ok());
    }
}
