//! Cache storage module
//!
//! This module provides persistent caching of upstream responses in a
//! directory on disk. Data is serialized to JSON format for storage and
//! expires after a configurable time-to-live.

use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to create or access cache directory
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read cached data
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write cached data
    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize cached data
    #[error("Failed to deserialize cache file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize data for caching
    #[error("Failed to serialize data: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A generic cache storage for serializable data
///
/// Entries are stored as one JSON file per identifier. An entry older than
/// the time-to-live is reported as missing.
#[derive(Debug)]
pub struct CacheStorage<T> {
    /// The directory where cached data is stored
    cache_dir: PathBuf,
    /// Maximum age of an entry, `None` keeps entries forever
    ttl: Option<Duration>,
    /// Phantom data for the generic type
    _phantom: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Opens or creates a cache storage in the given directory
    ///
    /// # Arguments
    ///
    /// * `cache_dir` - Directory holding the cache files, created if missing
    /// * `ttl` - Maximum age of an entry before it is considered stale
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cache: CacheStorage<Value> =
    ///     CacheStorage::open(Path::new("/tmp/maze"), Some(Duration::from_secs(3600)))?;
    /// ```
    pub fn open(cache_dir: &Path, ttl: Option<Duration>) -> Result<Self, CacheError> {
        fs::create_dir_all(cache_dir).map_err(|e| CacheError::DirectoryCreationFailed {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            ttl,
            _phantom: PhantomData,
        })
    }

    /// File holding the entry for `identifier`
    ///
    /// The readable prefix is lossy, so the name ends in a digest of the
    /// full identifier.
    fn entry_path(&self, identifier: &str) -> PathBuf {
        let prefix: String = sanitize_name(identifier)
            .chars()
            .take(MAX_PREFIX_LEN)
            .collect();
        let digest = blake3::hash(identifier.as_bytes());
        self.cache_dir
            .join(format!("{}-{}.json", prefix, digest.to_hex()))
    }

    /// Loads cached data for the given identifier
    ///
    /// Returns `None` if no entry exists or the entry has expired. Returns an
    /// error if the entry exists but cannot be read or deserialized.
    pub fn load(&self, identifier: &str) -> Result<Option<T>, CacheError> {
        let file_path = self.entry_path(identifier);

        // If file doesn't exist, return None
        if !file_path.exists() {
            return Ok(None);
        }

        if self.is_expired(&file_path) {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path).map_err(|e| CacheError::ReadFailed {
            path: file_path.clone(),
            source: e,
        })?;

        let data =
            serde_json::from_str(&content).map_err(|e| CacheError::DeserializationFailed {
                path: file_path,
                source: e,
            })?;

        Ok(Some(data))
    }

    /// Stores data in the cache with the given identifier
    ///
    /// The data is written to a uniquely named temporary file first and then
    /// moved into place, so concurrent readers never see a partial entry.
    pub fn store(&self, identifier: &str, data: &T) -> Result<(), CacheError> {
        let file_path = self.entry_path(identifier);
        let temp_path = self
            .cache_dir
            .join(format!(".{}.tmp", ulid::Ulid::new()));

        let content = serde_json::to_string(data)?;

        fs::write(&temp_path, content).map_err(|e| CacheError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, &file_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CacheError::WriteFailed {
                path: file_path,
                source: e,
            }
        })?;

        Ok(())
    }

    /// Returns the path to the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn is_expired(&self, file_path: &Path) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        fs::metadata(file_path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > ttl)
    }
}

/// Longest sanitized identifier prefix kept in entry file names
const MAX_PREFIX_LEN: usize = 64;

/// Sanitizes a name for use in file paths
///
/// Converts to lowercase and replaces all characters that are not
/// a-z, 0-9, or hyphen with underscores.
fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Simple"), "simple");
        assert_eq!(sanitize_name("/search/shows?q=lost"), "_search_shows_q_lost");
        assert_eq!(sanitize_name("With-Hyphens"), "with-hyphens");
        assert_eq!(sanitize_name("Mixed123ABC"), "mixed123abc");
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Value> = CacheStorage::open(dir.path(), None).unwrap();

        assert!(cache.load("/shows/1").unwrap().is_none());
        cache.store("/shows/1", &json!({"id": 1})).unwrap();
        assert_eq!(cache.load("/shows/1").unwrap(), Some(json!({"id": 1})));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_expired_entries_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Value> =
            CacheStorage::open(dir.path(), Some(Duration::ZERO)).unwrap();
        cache.store("/shows/1", &json!({"id": 1})).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.load("/shows/1").unwrap().is_none());
    }

    #[test]
    fn test_identifiers_with_same_sanitized_form_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Value> = CacheStorage::open(dir.path(), None).unwrap();

        cache
            .store("/search/shows?q=доктор", &json!([{"id": 1}]))
            .unwrap();
        assert!(cache.load("/search/shows?q=портал").unwrap().is_none());

        cache
            .store("/search/shows?q=lost_girl", &json!([{"id": 2}]))
            .unwrap();
        assert!(cache.load("/search/shows?q=lost girl").unwrap().is_none());
        assert_eq!(
            cache.load("/search/shows?q=доктор").unwrap(),
            Some(json!([{"id": 1}]))
        );
    }

    #[test]
    fn test_entry_path_is_readable_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Value> = CacheStorage::open(dir.path(), None).unwrap();

        let name = cache.entry_path("/shows/1");
        let name = name.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("_shows_1-"));
        assert!(name.ends_with(".json"));

        let long = format!("/search/shows?q={}", "a".repeat(500));
        let name = cache.entry_path(&long);
        assert!(name.file_name().unwrap().len() < 200);
        assert_ne!(cache.entry_path("/shows/1"), cache.entry_path("/Shows/1"));
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache: CacheStorage<Value> = CacheStorage::open(dir.path(), None).unwrap();
        fs::write(cache.entry_path("broken"), "{not json").unwrap();
        assert!(matches!(
            cache.load("broken"),
            Err(CacheError::DeserializationFailed { .. })
        ));
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache: CacheStorage<Value> = CacheStorage::open(&nested, None).unwrap();
        assert!(nested.is_dir());
        assert_eq!(cache.cache_dir(), nested.as_path());
    }
}
