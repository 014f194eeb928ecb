//! Cache storage module
//!
//! This module provides a small persistent key/value store on top of the
//! system's standard cache directory. Each key maps to one JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

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
/// Values implementing `Serialize` and `Deserialize` are stored as JSON
/// files, one per key, inside a single directory.
#[derive(Debug)]
pub struct CacheStorage<T> {
    /// The directory where cached data is stored
    cache_dir: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Opens or creates a cache storage with the given name
    ///
    /// The cache lives in the system's standard cache directory under a
    /// subdirectory named after the application and the (sanitized) name.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cache: CacheStorage<IndexSnapshot> = CacheStorage::open("index")?;
    /// ```
    pub fn open(name: &str) -> Result<Self, CacheError> {
        let proj_dirs = directories::ProjectDirs::from("de", "westhoffswelt", "tvdash")
            .ok_or(CacheError::CacheDirectoryNotFound)?;

        Self::open_in(proj_dirs.cache_dir().join(sanitize_name(name)))
    }

    /// Opens or creates a cache storage in an explicit directory
    pub fn open_in(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();

        fs::create_dir_all(&cache_dir).map_err(|e| CacheError::DirectoryCreationFailed {
            path: cache_dir.clone(),
            source: e,
        })?;

        Ok(Self {
            cache_dir,
            _phantom: PhantomData,
        })
    }

    /// Loads cached data for the given key
    ///
    /// # Arguments
    ///
    /// * `key` - The key the data was stored under
    ///
    /// # Returns
    ///
    /// An Option containing the cached data if it exists and is valid,
    /// or None if nothing has been stored under the key yet. Returns an
    /// error if the data exists but cannot be read or deserialized.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// if let Some(snapshot) = cache.load(INDEX_CACHE_KEY)? {
    ///     println!("Found {} cached show(s)", snapshot.shows.len());
    /// }
    /// ```
    pub fn load(&self, key: &str) -> Result<Option<T>, CacheError> {
        let file_path = self.file_path(key);

        if !file_path.exists() {
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

    /// Stores data under the given key, replacing whatever was there
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store the data under
    /// * `data` - The data to cache
    ///
    /// # Returns
    ///
    /// A Result indicating success or failure. Callers treating the cache as
    /// best effort may log and ignore the error.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// cache.store(INDEX_CACHE_KEY, &snapshot)?;
    /// ```
    pub fn store(&self, key: &str, data: &T) -> Result<(), CacheError> {
        let file_path = self.file_path(key);
        let content = serde_json::to_string(data)?;

        fs::write(&file_path, content).map_err(|e| CacheError::WriteFailed {
            path: file_path,
            source: e,
        })?;

        Ok(())
    }

    /// Returns the path to the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the file backing the given key
    pub fn file_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", sanitize_name(key)))
    }
}

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
