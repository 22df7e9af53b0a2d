//! Cached transport implementation
//!
//! This module provides a caching wrapper for transports that stores
//! upstream responses on disk and serves them until they expire.

use super::transport::{Request, Transport, TransportError};
use crate::cache::CacheStorage;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A caching wrapper for transports
///
/// Successful responses of the wrapped transport are stored in a persistent
/// cache keyed by the request path and query. Missing resources are not
/// cached, so a show added upstream becomes visible on the next request.
pub struct CachedTransport<T>
where
    T: Transport,
{
    /// The underlying transport
    inner: T,
    /// Cache storage for response bodies
    cache: CacheStorage<Value>,
}

impl<T> CachedTransport<T>
where
    T: Transport,
{
    /// Creates a new cached transport wrapping the given transport
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let http = HttpTransport::new(DEFAULT_BASE_URL, None, Duration::from_secs(30))?;
    /// let cache = CacheStorage::open(&cache_dir, Some(Duration::from_secs(86400)))?;
    /// let cached = CachedTransport::new(http, cache);
    /// ```
    pub fn new(inner: T, cache: CacheStorage<Value>) -> Self {
        Self { inner, cache }
    }
}

impl<T> Transport for CachedTransport<T>
where
    T: Transport,
{
    fn get_json(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, TransportError> {
        let cache_key = request.to_string();

        match self.cache.load(&cache_key) {
            Ok(Some(value)) => {
                debug!(request = %cache_key, "Serving response from cache");
                return Ok(Some(value));
            }
            Ok(None) => {
                // Cache miss - continue to fetch from upstream
            }
            Err(e) => {
                // Cache failures must not prevent metadata retrieval
                warn!(request = %cache_key, error = %e, "Ignoring unreadable cache entry");
            }
        }

        let response = self.inner.get_json(request, cancel)?;

        if let Some(ref value) = response {
            if let Err(e) = self.cache.store(&cache_key, value) {
                warn!(request = %cache_key, error = %e, "Failed to cache response");
            }
        }

        Ok(response)
    }
}
