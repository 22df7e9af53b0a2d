//! HTTP transport for the TVmaze API.

use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Failures while talking to the upstream service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP error {status} while loading URL {url}")]
    Http { status: u16, url: String },

    #[error("Connection error while loading URL {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Connection timed out while loading URL {url}")]
    Timeout { url: String },

    #[error("Unknown error while loading URL {url}: {message}")]
    Other { url: String, message: String },

    #[error("Request for URL {url} was cancelled")]
    Cancelled { url: String },
}

impl TransportError {
    /// Whether retrying the request may succeed
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Cancelled { .. })
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            TransportError::Timeout { url }
        } else if error.is_connect() {
            TransportError::Connection {
                url,
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            TransportError::Http {
                status: status.as_u16(),
                url,
            }
        } else {
            TransportError::Other {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A GET request against the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for (index, (key, value)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", separator, key, value)?;
        }
        Ok(())
    }
}

/// Something that can execute [`Request`]s and return their JSON body
///
/// Returns `Ok(None)` when the resource does not exist or the body is not
/// valid JSON. Implementations are shared between threads and should reuse
/// connections across calls.
pub trait Transport: Send + Sync {
    fn get_json(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError>;
}

/// Transport backed by a blocking reqwest client
///
/// This transport talks to https://api.tvmaze.com unless configured
/// otherwise, and keeps one connection pool for all requests.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport with its own client
    ///
    /// All requests go through `proxy` when one is given.
    pub fn new(
        base_url: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("maze-indexer/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy {
            debug!(proxy, "Using proxy for all requests");
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self::with_client(builder.build()?, base_url))
    }

    /// Creates a transport around an existing client, sharing its pool
    pub fn with_client(client: reqwest::blocking::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Transport for HttpTransport {
    fn get_json(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled { url });
        }

        debug!(url = %url, query = ?request.query, "Retrieving URL");

        let response = self
            .client
            .get(&url)
            .query(&request.query)
            .send()
            .map_err(|e| TransportError::from_reqwest(&url, e))?;

        // A missing resource is an answer, not a failure
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(TransportError::Http {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response
            .text()
            .map_err(|e| TransportError::from_reqwest(&url, e))?;

        match serde_json::from_str(&body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(url = %url, error = %e, "Response is not valid JSON, treating as empty");
                Ok(None)
            }
        }
    }
}
