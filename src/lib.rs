//! maze-indexer - TV show metadata from the TVmaze indexer
//!
//! This library searches shows by name, lets a pluggable strategy pick one
//! candidate, and loads it into a nested show / season / episode tree with
//! typed lookups. Upstream responses are normalized into canonical field
//! names, network calls are retried with exponential backoff, and loaded
//! shows are kept in a bounded in-memory cache.
//!
//! ```no_run
//! use maze_indexer::{IndexerClient, IndexerConfig};
//!
//! let client = IndexerClient::new(IndexerConfig::default())?;
//! let show = client.by_name("scrubs")?;
//! let episode = show.episode(1, 2)?;
//! println!("{}", episode);
//! # Ok::<(), maze_indexer::IndexerError>(())
//! ```

mod cache;
mod config;
mod indexer;
mod model;
mod normalize;
mod retry;
mod show_cache;

// Re-export error types
pub use cache::CacheError;
pub use config::ConfigError;
pub use indexer::{IndexerError, SelectionError, TransportError};
pub use model::LookupError;

pub use config::{
    CacheConfig, DEFAULT_BASE_URL, IndexerConfig, RetryConfig, language_id, valid_languages,
};
pub use indexer::{
    CachedTransport, ConsoleSelector, FirstResult, HttpTransport, IndexerClient,
    IndexerClientBuilder, Request, ScheduleEntry, ShowInfo, ShowSelector, Transport,
};
pub use model::{
    Actor, Actors, Banner, Episode, EpisodeKey, Key, Season, Show, ShowEntry, ShowParts,
    ShowSummary,
};
pub use normalize::{
    EpisodeOrder, FieldWarning, Normalized, actor_from_cast, banners_from_images, cast_fields,
    clean_text, coerce_number, episode_fields, poster_banner, resolve_numbering, show_fields,
};
pub use retry::{Cancelled, RetryError, RetryPolicy, Sleeper, ThreadSleeper, retry_with_backoff};
pub use show_cache::{
    Clock, DEFAULT_RETENTION_SIZE, DEFAULT_SWEEP_INTERVAL, ShowCache, SystemClock,
};

pub use cache::CacheStorage;
