//! Indexer client
//!
//! The [`IndexerClient`] orchestrates search, show selection, fetching,
//! normalization and caching. Network access goes through a [`Transport`],
//! which is retried with backoff, and populated shows are kept in a bounded
//! [`ShowCache`].

mod cached;
#[cfg(test)]
mod fake;
mod schedule;
mod selection;
mod transport;

pub use cached::CachedTransport;
pub use schedule::{ScheduleEntry, ShowInfo};
pub use selection::{ConsoleSelector, FirstResult, SelectionError, ShowSelector};
pub use transport::{HttpTransport, Request, Transport, TransportError};

use crate::cache::CacheStorage;
use crate::config::{ConfigError, IndexerConfig};
use crate::model::{Actor, Actors, LookupError, Show, ShowParts, ShowSummary};
use crate::normalize::{
    Normalized, actor_from_cast, banners_from_images, episode_fields, poster_banner,
    resolve_numbering, show_fields,
};
use crate::retry::{RetryError, RetryPolicy, Sleeper, ThreadSleeper, retry_with_backoff};
use crate::show_cache::{Clock, ShowCache, SystemClock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors surfaced by the indexer client
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The upstream service could not be reached, even after retrying
    #[error("Indexer request failed: {0}")]
    Network(TransportError),

    /// A search yielded no candidates, or the show does not exist upstream
    #[error("Show not found: {0}")]
    ShowNotFound(String),

    /// The episode list of a show was missing or malformed
    #[error("Show {0} returned incomplete results (episode list missing)")]
    ShowIncomplete(u64),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The show selection was cancelled by the user
    #[error("Show selection aborted by user")]
    UserAbort,

    #[error("Show selection failed: {0}")]
    Selection(String),

    /// The client's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<SelectionError> for IndexerError {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::Aborted => IndexerError::UserAbort,
            SelectionError::Prompt(message) => IndexerError::Selection(message),
        }
    }
}

/// Builder for an [`IndexerClient`]
///
/// Every collaborator has a default, so `IndexerClient::builder().build()`
/// yields a working client talking to the public API.
pub struct IndexerClientBuilder {
    config: IndexerConfig,
    transport: Option<Arc<dyn Transport>>,
    http_client: Option<reqwest::blocking::Client>,
    selector: Option<Arc<dyn ShowSelector>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    clock: Option<Arc<dyn Clock>>,
    cancel: Option<CancellationToken>,
}

impl IndexerClientBuilder {
    pub fn config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the whole network layer
    ///
    /// The transport is used as given; the response cache, base URL, proxy
    /// and timeout settings do not apply to it.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Shares an existing HTTP session, and thus its connection pool
    ///
    /// The proxy and timeout settings do not apply to a shared session.
    pub fn http_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn selector(mut self, selector: Arc<dyn ShowSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Token that aborts in-flight retries and requests when cancelled
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Validates the configuration and assembles the client
    ///
    /// Fails before any network activity when the configuration is invalid.
    pub fn build(self) -> Result<IndexerClient, IndexerError> {
        let config = self.config;
        config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&config, self.http_client)?,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let shows = ShowCache::with_policy(config.retention_size, config.sweep_interval(), clock);

        Ok(IndexerClient {
            retry: config.retry_policy(),
            transport,
            selector: self.selector.unwrap_or_else(|| Arc::new(FirstResult)),
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
            cancel: self.cancel.unwrap_or_default(),
            shows,
            fetch_guards: Mutex::new(HashMap::new()),
            config,
        })
    }
}

/// HTTP transport for `config`, behind the response cache when enabled
fn default_transport(
    config: &IndexerConfig,
    client: Option<reqwest::blocking::Client>,
) -> Result<Arc<dyn Transport>, IndexerError> {
    let http = match client {
        Some(client) => HttpTransport::with_client(client, &config.base_url),
        None => HttpTransport::new(
            &config.base_url,
            config.proxy.as_deref(),
            config.request_timeout(),
        )?,
    };

    let Some(cache_dir) = config.cache_dir()? else {
        debug!("Response cache disabled");
        return Ok(Arc::new(http));
    };

    match CacheStorage::open(&cache_dir, Some(config.cache_ttl())) {
        Ok(cache) => {
            debug!(path = %cache_dir.display(), "Using response cache");
            Ok(Arc::new(CachedTransport::new(http, cache)))
        }
        Err(e) => {
            // An unusable cache must not prevent metadata retrieval
            warn!(error = %e, "Response cache unavailable, continuing without it");
            Ok(Arc::new(http))
        }
    }
}

/// Client for the TVmaze indexer
///
/// The client is `Send + Sync` and meant to be shared (e.g. in an `Arc`)
/// between threads. Fetches of different shows run in parallel; concurrent
/// fetches of the same show are coalesced into one.
pub struct IndexerClient {
    config: IndexerConfig,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
    selector: Arc<dyn ShowSelector>,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancellationToken,
    shows: ShowCache,
    fetch_guards: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl IndexerClient {
    pub fn builder() -> IndexerClientBuilder {
        IndexerClientBuilder {
            config: IndexerConfig::default(),
            transport: None,
            http_client: None,
            selector: None,
            sleeper: None,
            clock: None,
            cancel: None,
        }
    }

    /// Creates a client with default collaborators for `config`
    pub fn new(config: IndexerConfig) -> Result<Self, IndexerError> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Token cancelling every operation of this client
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs a request through the retry policy
    fn fetch(&self, request: Request) -> Result<Option<Value>, IndexerError> {
        retry_with_backoff(
            &self.retry,
            self.sleeper.as_ref(),
            &self.cancel,
            TransportError::is_transient,
            || self.transport.get_json(&request, &self.cancel),
        )
        .map_err(|e| match e {
            RetryError::Cancelled | RetryError::Failed(TransportError::Cancelled { .. }) => {
                IndexerError::Cancelled
            }
            RetryError::Failed(error) => IndexerError::Network(error),
        })
    }

    /// Searches shows by name, best match first
    ///
    /// Candidates without a usable id are dropped. No match is not an error.
    pub fn search_shows(&self, name: &str) -> Result<Vec<ShowSummary>, IndexerError> {
        let term = name.trim().to_lowercase();
        debug!(term = %term, "Searching for show");

        let request = Request::new("/search/shows").query("q", term.as_str());
        let candidates: Vec<ShowSummary> = match self.fetch(request)? {
            Some(Value::Array(results)) => results
                .iter()
                .filter_map(|result| result.get("show"))
                .filter_map(|show| ShowSummary::from_normalized(show_fields(show)))
                .collect(),
            _ => Vec::new(),
        };

        debug!(term = %term, count = candidates.len(), "Search finished");
        Ok(candidates)
    }

    /// Searches shows by name and lets the selector pick exactly one
    pub fn resolve_show(&self, name: &str) -> Result<ShowSummary, IndexerError> {
        let candidates = self.search_shows(name)?;
        if candidates.is_empty() {
            debug!(name, "Series result returned zero");
            return Err(IndexerError::ShowNotFound(name.to_string()));
        }

        let selected = self.selector.select(&candidates)?;
        info!(show = %selected, id = selected.id(), "Selected show");
        Ok(selected.clone())
    }

    /// Returns the show with the given id, fetching it when not cached
    ///
    /// Show information is always fetched; `parts` selects which of the
    /// episode list, cast and artwork are fetched too. A cached show is
    /// returned as is when it already holds every requested part, otherwise
    /// it is refetched with the union of both and replaced in the cache.
    pub fn get_show(&self, id: u64, parts: ShowParts) -> Result<Arc<Show>, IndexerError> {
        self.load_show(id, parts, None)
    }

    /// Resolves a show by name and loads it with its episodes
    ///
    /// Cast and artwork are loaded as configured. Fields of the search result
    /// are kept, but show information wins where both define a field.
    pub fn by_name(&self, name: &str) -> Result<Arc<Show>, IndexerError> {
        let summary = self.resolve_show(name)?;
        let parts = ShowParts {
            episodes: true,
            actors: self.config.actors,
            banners: self.config.banners,
        };
        self.load_show(summary.id(), parts, Some(&summary))
    }

    /// The cached show for `id`, without any network access
    pub fn cached_show(&self, id: u64) -> Option<Arc<Show>> {
        self.shows.get(id)
    }

    fn cached_covering(&self, id: u64, parts: ShowParts) -> Result<Arc<Show>, ShowParts> {
        match self.shows.get(id) {
            Some(show) if show.parts().covers(&parts) => Ok(show),
            Some(show) => {
                let cached = show.parts();
                Err(ShowParts {
                    episodes: parts.episodes || cached.episodes,
                    actors: parts.actors || cached.actors,
                    banners: parts.banners || cached.banners,
                })
            }
            None => Err(parts),
        }
    }

    fn fetch_guard(&self, id: u64) -> Arc<Mutex<()>> {
        self.fetch_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }

    /// Forgets the guard of `id`, unless a later caller already replaced it
    fn release_fetch_guard(&self, id: u64, guard: &Arc<Mutex<()>>) {
        let mut guards = self
            .fetch_guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guards.get(&id).is_some_and(|current| Arc::ptr_eq(current, guard)) {
            guards.remove(&id);
        }
    }

    fn load_show(
        &self,
        id: u64,
        parts: ShowParts,
        seed: Option<&ShowSummary>,
    ) -> Result<Arc<Show>, IndexerError> {
        if let Ok(show) = self.cached_covering(id, parts) {
            debug!(id, "Serving show from cache");
            return Ok(show);
        }

        let guard = self.fetch_guard(id);
        let _fetching = guard.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have finished the same fetch while we waited
        let parts = match self.cached_covering(id, parts) {
            Ok(show) => {
                debug!(id, "Show was fetched concurrently");
                return Ok(show);
            }
            Err(parts) => parts,
        };

        let result = self.build_show(id, parts, seed).map(Arc::new);
        if let Ok(ref show) = result {
            self.shows.insert(id, show.clone());
        }
        self.release_fetch_guard(id, &guard);
        result
    }

    fn build_show(
        &self,
        id: u64,
        parts: ShowParts,
        seed: Option<&ShowSummary>,
    ) -> Result<Show, IndexerError> {
        let mut show = Show::new(id);
        if let Some(summary) = seed {
            show.merge_data(Normalized {
                fields: summary.fields().clone(),
                warnings: Vec::new(),
            });
        }

        debug!(id, language = %self.config.language, "Configured language overrides show language");
        show.set_language(self.config.language.as_str());

        debug!(id, "Getting all show data");
        let info = self
            .fetch(Request::new(format!("/shows/{}", id)))?
            .ok_or_else(|| IndexerError::ShowNotFound(id.to_string()))?;
        show.merge_data(show_fields(&info));

        if parts.banners {
            self.load_banners(&mut show)?;
        }
        if parts.actors {
            self.load_actors(&mut show)?;
        }
        if parts.episodes {
            self.load_episodes(&mut show)?;
        }

        info!(
            id,
            show = show.name().unwrap_or("unknown"),
            episodes = show.episode_count(),
            "Loaded show"
        );
        Ok(show)
    }

    fn load_banners(&self, show: &mut Show) -> Result<(), IndexerError> {
        let id = show.id();
        debug!(id, "Getting show banners");

        let mut banners = self
            .fetch(Request::new(format!("/shows/{}/images", id)))?
            .map(|images| banners_from_images(&images))
            .unwrap_or_default();

        if banners.is_empty() {
            match show.image_original() {
                Some(original) => banners.push(poster_banner(original)),
                None => debug!(id, "Could not find a poster"),
            }
        }

        show.set_banners(banners);
        Ok(())
    }

    fn load_actors(&self, show: &mut Show) -> Result<(), IndexerError> {
        let id = show.id();
        debug!(id, "Getting actors");

        let actors: Vec<Actor> = match self.fetch(Request::new(format!("/shows/{}/cast", id)))? {
            Some(Value::Array(cast)) => cast
                .iter()
                .enumerate()
                .map(|(index, entry)| actor_from_cast(entry, index))
                .collect(),
            _ => {
                debug!(id, "Actors result returned zero");
                Vec::new()
            }
        };

        show.set_actors(Actors::from(actors));
        Ok(())
    }

    fn load_episodes(&self, show: &mut Show) -> Result<(), IndexerError> {
        let id = show.id();
        let order = self.config.episode_order();
        debug!(id, order = ?order, "Getting all episodes");

        let request = Request::new(format!("/shows/{}/episodes", id)).query("specials", "1");
        let Some(Value::Array(episodes)) = self.fetch(request)? else {
            return Err(IndexerError::ShowIncomplete(id));
        };

        for raw in &episodes {
            let normalized = episode_fields(raw);
            for warning in normalized.warnings {
                show.push_warning(warning);
            }

            let Some((season, episode)) = resolve_numbering(&normalized.fields, order) else {
                warn!(
                    id,
                    season = ?normalized.fields.get("seasonnumber"),
                    episode = ?normalized.fields.get("episodenumber"),
                    "An episode has incomplete season/episode number, skipping it"
                );
                continue;
            };

            show.insert_episode(season, episode, normalized.fields);
        }

        show.mark_episodes_loaded();
        Ok(())
    }
}
